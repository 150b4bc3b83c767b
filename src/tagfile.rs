//! Doxygen tagfile indices: loading, normalization, and symbol lookup.
//!
//! A tagfile is XML shaped like
//!
//! ```xml
//! <tagfile>
//!   <compound kind="namespace">
//!     <name>std</name>
//!     <filename>cpp</filename>
//!     <member kind="function">
//!       <name>abort</name>
//!       <anchorfile>cpp/utility/program/abort</anchorfile>
//!       <anchor></anchor>
//!     </member>
//!   </compound>
//!   <compound kind="class">
//!     <name>std::vector</name>
//!     <filename>cpp/container/vector</filename>
//!   </compound>
//! </tagfile>
//! ```
//!
//! Only `compound` and `member` records survive loading. Each record keeps its
//! `kind` attribute and its `name`, `filename`, `anchorfile` and `anchor`
//! texts; everything else is ignored. Child records are always stored as
//! ordered vectors, however many the document had.
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, error, trace};

use crate::error::Error;
use crate::types::TagfileDescriptor;

/// A `<compound>` record: a namespace, class, struct, file, page...
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    /// Nested `<compound>` records, in document order.
    pub compounds: Vec<Compound>,
    /// Documentation page of the compound, relative to the base URL.
    pub filename: Option<String>,
    /// The `kind` attribute (`class`, `namespace`, `file`...).
    pub kind: String,
    /// Nested `<member>` records, in document order.
    pub members: Vec<Member>,
    /// Qualified name of the compound.
    pub name: Option<String>,
}

/// A `<member>` record nested under a compound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Member {
    /// Fragment within the anchor file. Empty anchors are ignored.
    pub anchor: Option<String>,
    /// Documentation page of the member, relative to the base URL.
    pub anchorfile: Option<String>,
    /// The `kind` attribute (`function`, `variable`...).
    pub kind: String,
    /// Unqualified member name.
    pub name: Option<String>,
}

/// The records of one parsed tagfile. The document root behaves like an
/// anonymous scope with no enclosing namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagTree {
    /// Top-level compounds.
    pub compounds: Vec<Compound>,
    /// Members directly under the root, outside any compound.
    pub members: Vec<Member>,
}

/// A registered documentation source: a parsed tagfile plus where its pages live.
#[derive(Debug, Clone)]
pub struct Tagfile {
    /// URL prefix joined with every filename found in the tree.
    pub base_url: String,
    /// Component this tagfile is restricted to. `None` applies everywhere.
    pub component: Option<String>,
    /// Whether links open in a new window.
    pub external: bool,
    /// Where the tagfile was read from.
    pub file: PathBuf,
    /// The parsed records. Empty when the file could not be loaded.
    pub tree: TagTree,
}

/// Which text field of the enclosing record an element fills.
#[derive(Debug, Clone, Copy)]
enum Field {
    Anchor,
    Anchorfile,
    Filename,
    Name,
}

/// Parser stack frame, one per open element.
#[derive(Debug)]
enum Frame {
    Compound(Compound),
    Field(Field, String),
    Member(Member),
    Other,
}

/// A finished record waiting to be attached to its parent.
enum Record {
    Compound(Compound),
    Member(Member),
}

impl Tagfile {
    /// Whether lookups scoped to `component` consult this tagfile.
    pub fn applies_to(&self, component: Option<&str>) -> bool {
        return match self.component.as_deref() {
            None => true,
            Some(own) => component == Some(own),
        };
    }

    /// Format a link to `path` under this tagfile's base URL.
    ///
    /// `text` is inserted as given; callers escape it.
    pub fn format_link(&self, path: &str, text: &str) -> String {
        if self.external {
            return format!("{}{path}[{text},window=\"_blank\"]", self.base_url);
        }
        return format!("{}{path}[{text}]", self.base_url);
    }

    /// Build a tagfile from an already parsed tree.
    pub fn from_tree(descriptor: &TagfileDescriptor, tree: TagTree) -> Self {
        return Self {
            base_url: descriptor.base_url.clone(),
            component: descriptor.component.clone(),
            external: descriptor.external,
            file: descriptor.file.clone(),
            tree,
        };
    }

    /// Read and parse the tagfile a descriptor points at.
    ///
    /// A missing or malformed file is logged and yields an empty index: the
    /// source stays registered but never matches.
    pub fn load(descriptor: &TagfileDescriptor) -> Self {
        let tree = match std::fs::read_to_string(&descriptor.file) {
            Err(e) => {
                error!(file = %descriptor.file.display(), "tagfile not found: {e}");
                TagTree::default()
            },
            Ok(xml) => match parse_tagfile(&descriptor.file, &xml) {
                Err(e) => {
                    error!(file = %descriptor.file.display(), "{e}");
                    TagTree::default()
                },
                Ok(tree) => tree,
            },
        };
        debug!(
            file = %descriptor.file.display(),
            compounds = tree.compound_count(),
            component = ?descriptor.component,
            "registered tagfile"
        );
        return Self::from_tree(descriptor, tree);
    }

    /// Find the page of an include file such as `<algorithm>` or `"url.hpp"`.
    pub fn lookup_include_file(&self, symbol: &str) -> Option<String> {
        return lookup_include_file(&self.tree, symbol);
    }

    /// Find the page of a (possibly qualified) symbol from the root scope.
    pub fn lookup_symbol(&self, symbol: &str) -> Option<String> {
        return lookup(&self.tree, symbol);
    }
}

impl TagTree {
    /// Total number of compounds, nested ones included.
    pub fn compound_count(&self) -> usize {
        return count_compounds(&self.compounds);
    }
}

/// Store field text on the record directly enclosing it.
fn assign_field(stack: &mut [Frame], field: Field, text: String) {
    match (stack.last_mut(), field) {
        (Some(Frame::Compound(compound)), Field::Filename) => compound.filename = Some(text),
        (Some(Frame::Compound(compound)), Field::Name) => compound.name = Some(text),
        (Some(Frame::Member(member)), Field::Anchor) => member.anchor = Some(text),
        (Some(Frame::Member(member)), Field::Anchorfile) => member.anchorfile = Some(text),
        (Some(Frame::Member(member)), Field::Name) => member.name = Some(text),
        _ => {},
    }
    return;
}

/// Put a finished record under the innermost open compound, or the root.
fn attach_record(stack: &mut [Frame], tree: &mut TagTree, record: Record) {
    let parent = stack.iter_mut().rev().find_map(|frame| {
        return match frame {
            Frame::Compound(compound) => Some(compound),
            _ => None,
        };
    });
    match (parent, record) {
        (None, Record::Compound(compound)) => tree.compounds.push(compound),
        (None, Record::Member(member)) => tree.members.push(member),
        (Some(parent), Record::Compound(compound)) => parent.compounds.push(compound),
        (Some(parent), Record::Member(member)) => parent.members.push(member),
    }
    return;
}

/// Finish the innermost frame when its element closes.
fn close_frame(stack: &mut Vec<Frame>, tree: &mut TagTree) {
    match stack.pop() {
        Some(Frame::Compound(compound)) => attach_record(stack, tree, Record::Compound(compound)),
        Some(Frame::Field(field, text)) => assign_field(stack, field, text),
        Some(Frame::Member(member)) => attach_record(stack, tree, Record::Member(member)),
        Some(Frame::Other) | None => {},
    }
    return;
}

/// Recursive compound count.
fn count_compounds(compounds: &[Compound]) -> usize {
    return compounds.iter().fold(0_usize, |total, compound| {
        return total.saturating_add(1).saturating_add(count_compounds(&compound.compounds));
    });
}

/// Map a record field element name to the field it fills.
fn field_for(element: &[u8]) -> Option<Field> {
    return match element {
        b"anchor" => Some(Field::Anchor),
        b"anchorfile" => Some(Field::Anchorfile),
        b"filename" => Some(Field::Filename),
        b"name" => Some(Field::Name),
        _ => None,
    };
}

/// Read the `kind` attribute of a record element. Absent means empty.
///
/// # Errors
///
/// Returns `Error::TagfileMalformed` if the attribute cannot be decoded.
fn kind_attribute(path: &Path, element: &BytesStart<'_>) -> Result<String, Error> {
    let malformed = |reason: String| {
        return Error::TagfileMalformed { path: path.to_path_buf(), reason };
    };
    let Some(attr) = element.try_get_attribute("kind").map_err(|e| return malformed(e.to_string()))? else {
        return Ok(String::new());
    };
    let value = attr.unescape_value().map_err(|e| return malformed(e.to_string()))?;
    return Ok(value.into_owned());
}

/// Search a tree for a symbol, starting from the root scope.
pub fn lookup(tree: &TagTree, symbol: &str) -> Option<String> {
    return lookup_in_scope(&tree.compounds, &tree.members, symbol, "");
}

/// One scope of the tree walk. Checks run in a fixed order and the first
/// match wins: class/struct compounds by full name, then function members
/// qualified by `namespace`, then descent into namespaces and classes whose
/// name prefixes the symbol.
fn lookup_in_scope(
    compounds: &[Compound],
    members: &[Member],
    symbol: &str,
    namespace: &str,
) -> Option<String> {
    trace!(symbol, namespace, "tagfile lookup");

    for compound in compounds {
        if !matches!(compound.kind.as_str(), "class" | "struct") {
            continue;
        }
        if compound.name.as_deref() == Some(symbol) {
            if let Some(filename) = &compound.filename {
                return Some(filename.clone());
            }
        }
    }

    for member in members {
        if member.kind != "function" {
            continue;
        }
        let Some(name) = member.name.as_deref() else {
            continue;
        };
        let matches_symbol = if namespace.is_empty() {
            name == symbol
        } else {
            symbol.strip_prefix(namespace).and_then(|rest| return rest.strip_prefix("::")) == Some(name)
        };
        if !matches_symbol {
            continue;
        }
        if let Some(anchorfile) = &member.anchorfile {
            return Some(member_target(anchorfile, member.anchor.as_deref()));
        }
    }

    for compound in compounds {
        if !matches!(compound.kind.as_str(), "namespace" | "class") {
            continue;
        }
        let Some(name) = compound.name.as_deref() else {
            continue;
        };
        if name == symbol {
            if let Some(filename) = &compound.filename {
                return Some(filename.clone());
            }
        }
        let is_nested = symbol.strip_prefix(name).is_some_and(|rest| return rest.starts_with("::"));
        if !is_nested {
            continue;
        }
        // An empty filename in a nested scope is a miss; sibling scopes still get a turn.
        if let Some(found) = lookup_in_scope(&compound.compounds, &compound.members, symbol, name)
            .filter(|found| return !found.is_empty())
        {
            return Some(found);
        }
    }

    return None;
}

/// Find the page of an include file by its bare name.
///
/// The first and last characters (the quotes or angle brackets) are dropped
/// and the rest is compared with each root compound's name.
pub fn lookup_include_file(tree: &TagTree, symbol: &str) -> Option<String> {
    let mut chars = symbol.chars();
    chars.next();
    chars.next_back();
    let target = chars.as_str();

    return tree
        .compounds
        .iter()
        .find(|compound| return compound.name.as_deref() == Some(target))
        .and_then(|compound| return compound.filename.clone());
}

/// Join an anchor file with its anchor, if any.
fn member_target(anchorfile: &str, anchor: Option<&str>) -> String {
    return match anchor {
        Some(anchor) if !anchor.is_empty() => format!("{anchorfile}#{anchor}"),
        _ => anchorfile.to_string(),
    };
}

/// Open a frame for a start tag.
///
/// # Errors
///
/// Returns `Error::TagfileMalformed` if the element's attributes are malformed.
fn open_frame(path: &Path, stack: &[Frame], element: &BytesStart<'_>) -> Result<Frame, Error> {
    let name = element.name();
    return match name.as_ref() {
        b"compound" => Ok(Frame::Compound(Compound {
            kind: kind_attribute(path, element)?,
            ..Compound::default()
        })),
        b"member" => Ok(Frame::Member(Member {
            kind: kind_attribute(path, element)?,
            ..Member::default()
        })),
        other => {
            let in_record = matches!(stack.last(), Some(Frame::Compound(_) | Frame::Member(_)));
            match field_for(other) {
                Some(field) if in_record => Ok(Frame::Field(field, String::new())),
                _ => Ok(Frame::Other),
            }
        },
    };
}

/// Parse tagfile XML into a normalized record tree.
///
/// # Errors
///
/// Returns `Error::TagfileMalformed` if the XML is not well-formed.
pub fn parse_tagfile(path: &Path, xml: &str) -> Result<TagTree, Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut tree = TagTree::default();
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            return Error::TagfileMalformed {
                path: path.to_path_buf(),
                reason: format!("at byte {}: {e}", reader.error_position()),
            };
        })?;
        match event {
            Event::CData(data) => push_text(&mut stack, &String::from_utf8_lossy(&data.into_inner())),
            Event::Empty(element) => {
                let frame = open_frame(path, &stack, &element)?;
                stack.push(frame);
                close_frame(&mut stack, &mut tree);
            },
            Event::End(_) => close_frame(&mut stack, &mut tree),
            Event::Eof => break,
            Event::Start(element) => {
                let frame = open_frame(path, &stack, &element)?;
                stack.push(frame);
            },
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| {
                    return Error::TagfileMalformed { path: path.to_path_buf(), reason: e.to_string() };
                })?;
                push_text(&mut stack, &text);
            },
            _ => {},
        }
    }

    return Ok(tree);
}

/// Append character data to the open field, if one is open.
fn push_text(stack: &mut [Frame], text: &str) {
    if let Some(Frame::Field(_, buffer)) = stack.last_mut() {
        buffer.push_str(text);
    }
    return;
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPPREFERENCE_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tagfile>
  <compound kind="file">
    <name>algorithm</name>
    <filename>cpp/header/algorithm</filename>
  </compound>
  <compound kind="namespace">
    <name>std</name>
    <filename></filename>
    <class kind="class">std::vector</class>
    <member kind="function">
      <type>T</type>
      <name>abort</name>
      <anchorfile>cpp/utility/program/abort</anchorfile>
      <anchor></anchor>
      <arglist>(T... args)</arglist>
    </member>
    <member kind="function">
      <name>swap</name>
      <anchorfile>cpp/algorithm/swap</anchorfile>
      <anchor>Notes</anchor>
    </member>
    <member kind="variable">
      <name>cout</name>
      <anchorfile>cpp/io/cout</anchorfile>
    </member>
  </compound>
  <compound kind="class">
    <name>std::vector</name>
    <filename>cpp/container/vector</filename>
  </compound>
  <compound kind="class">
    <name>std::allocator</name>
    <filename>cpp/memory/allocator</filename>
    <member kind="function">
      <name>address</name>
      <anchorfile>cpp/memory/allocator/address</anchorfile>
    </member>
  </compound>
</tagfile>
"#;

    fn sample_tree() -> TagTree {
        return parse_tagfile(Path::new("sample.tag.xml"), CPPREFERENCE_SAMPLE).unwrap();
    }

    #[test]
    fn loader_keeps_records_in_order() {
        let tree = sample_tree();
        let kinds: Vec<&str> = tree.compounds.iter().map(|c| c.kind.as_str()).collect();
        assert_eq!(kinds, vec!["file", "namespace", "class", "class"]);
        assert_eq!(tree.compounds[1].members.len(), 3);
        assert_eq!(tree.compounds[1].members[0].anchor, Some(String::new()));
        assert_eq!(tree.compound_count(), 4);
    }

    #[test]
    fn single_member_is_still_a_sequence() {
        let tree = sample_tree();
        assert_eq!(tree.compounds[3].members.len(), 1);
        assert_eq!(tree.compounds[3].members[0].name.as_deref(), Some("address"));
    }

    #[test]
    fn class_compound_matches_full_name() {
        assert_eq!(lookup(&sample_tree(), "std::vector").as_deref(), Some("cpp/container/vector"));
    }

    #[test]
    fn namespace_member_function_matches_qualified_name() {
        let tree = sample_tree();
        assert_eq!(lookup(&tree, "std::abort").as_deref(), Some("cpp/utility/program/abort"));
        assert_eq!(lookup(&tree, "std::swap").as_deref(), Some("cpp/algorithm/swap#Notes"));
    }

    #[test]
    fn class_member_function_is_found_by_descent() {
        assert_eq!(
            lookup(&sample_tree(), "std::allocator::address").as_deref(),
            Some("cpp/memory/allocator/address")
        );
    }

    #[test]
    fn non_function_members_are_skipped() {
        assert_eq!(lookup(&sample_tree(), "std::cout"), None);
    }

    #[test]
    fn namespace_itself_links_to_its_filename() {
        assert_eq!(lookup(&sample_tree(), "std").as_deref(), Some(""));
    }

    #[test]
    fn unqualified_names_do_not_match_namespace_members() {
        assert_eq!(lookup(&sample_tree(), "abort"), None);
    }

    #[test]
    fn prefix_without_separator_does_not_descend() {
        assert_eq!(lookup(&sample_tree(), "stdx::abort"), None);
    }

    #[test]
    fn include_file_strips_delimiters() {
        let tree = sample_tree();
        assert_eq!(lookup_include_file(&tree, "<algorithm>").as_deref(), Some("cpp/header/algorithm"));
        assert_eq!(lookup_include_file(&tree, "\"algorithm\"").as_deref(), Some("cpp/header/algorithm"));
        assert_eq!(lookup_include_file(&tree, "<numeric>"), None);
    }

    #[test]
    fn records_missing_fields_fail_their_branch_only() {
        let xml = r#"<tagfile>
            <compound kind="class"><name>Broken</name></compound>
            <compound><name>NoKind</name><filename>nokind</filename></compound>
            <member kind="function"><name>free_fn</name></member>
            <member kind="function"><name>linked</name><anchorfile>linked.html</anchorfile></member>
        </tagfile>"#;
        let tree = parse_tagfile(Path::new("partial.tag.xml"), xml).unwrap();
        assert_eq!(lookup(&tree, "Broken"), None);
        assert_eq!(lookup(&tree, "NoKind"), None);
        assert_eq!(lookup(&tree, "free_fn"), None);
        assert_eq!(lookup(&tree, "linked").as_deref(), Some("linked.html"));
    }

    #[test]
    fn nested_compounds_are_searched() {
        let xml = r#"<tagfile>
            <compound kind="namespace"><name>boost</name>
              <compound kind="namespace"><name>boost::urls</name>
                <compound kind="class"><name>boost::urls::url</name><filename>url.html</filename></compound>
                <member kind="function"><name>parse_uri</name><anchorfile>parse_uri.html</anchorfile></member>
              </compound>
            </compound>
        </tagfile>"#;
        let tree = parse_tagfile(Path::new("nested.tag.xml"), xml).unwrap();
        assert_eq!(tree.compound_count(), 3);
        assert_eq!(lookup(&tree, "boost::urls::parse_uri").as_deref(), Some("parse_uri.html"));
        assert_eq!(lookup(&tree, "boost::urls::url").as_deref(), Some("url.html"));
    }

    #[test]
    fn empty_nested_filename_falls_through_to_next_scope() {
        let xml = r#"<tagfile>
            <compound kind="namespace"><name>ns</name>
              <compound kind="class"><name>ns::A</name><filename></filename></compound>
            </compound>
            <compound kind="namespace"><name>ns</name>
              <compound kind="class"><name>ns::A</name><filename>a.html</filename></compound>
            </compound>
        </tagfile>"#;
        let tree = parse_tagfile(Path::new("empty.tag.xml"), xml).unwrap();
        assert_eq!(lookup(&tree, "ns::A").as_deref(), Some("a.html"));
    }

    #[test]
    fn entities_in_names_are_decoded() {
        let xml = r#"<tagfile><compound kind="class"><name>ns::less&lt;&gt;</name><filename>less</filename></compound></tagfile>"#;
        let tree = parse_tagfile(Path::new("entities.tag.xml"), xml).unwrap();
        assert_eq!(tree.compounds[0].name.as_deref(), Some("ns::less<>"));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let result = parse_tagfile(Path::new("bad.tag.xml"), "<tagfile><compound></tagfile>");
        assert!(matches!(result, Err(Error::TagfileMalformed { .. })));
    }

    #[test]
    fn missing_file_loads_as_empty_index() {
        let descriptor = TagfileDescriptor {
            base_url: "https://example.com/".to_string(),
            component: None,
            external: true,
            file: PathBuf::from("does/not/exist.tag.xml"),
        };
        let tagfile = Tagfile::load(&descriptor);
        assert_eq!(tagfile.tree, TagTree::default());
        assert_eq!(tagfile.lookup_symbol("std::vector"), None);
    }

    #[test]
    fn scope_filter_and_link_format() {
        let descriptor = TagfileDescriptor {
            base_url: "https://example.com/".to_string(),
            component: Some("url".to_string()),
            external: false,
            file: PathBuf::from("url.tag.xml"),
        };
        let tagfile = Tagfile::from_tree(&descriptor, TagTree::default());
        assert!(tagfile.applies_to(Some("url")));
        assert!(!tagfile.applies_to(Some("json")));
        assert!(!tagfile.applies_to(None));
        assert_eq!(tagfile.format_link("a/b", "text"), "https://example.com/a/b[text]");
    }
}
