/// Core domain types shared by configuration, the resolver, and the scanner.
use std::path::PathBuf;

/// Where a tagfile lives and how its links are rendered.
/// Produced by configuration; turned into a `Tagfile` by loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagfileDescriptor {
    /// URL prefix for every page named in the tagfile.
    pub base_url: String,
    /// Component the tagfile is restricted to. `None` applies everywhere.
    pub component: Option<String>,
    /// Whether links open in a new window.
    pub external: bool,
    /// Path to the tagfile XML.
    pub file: PathBuf,
}

/// One `cpp:<target>[<text>]` occurrence found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroRef {
    /// One-based line number of the macro.
    pub line: u32,
    /// Literal link text between the brackets. `None` when the brackets are empty.
    pub text: Option<String>,
    /// The macro target as written, possibly entity-encoded.
    pub target: String,
}

/// A request to link one symbol.
#[derive(Debug, Clone, Copy)]
pub struct LinkRequest<'a> {
    /// Component whose tagfiles and using-namespaces apply. `None` means global only.
    pub component: Option<&'a str>,
    /// Symbol text as written in the document, possibly entity-encoded.
    pub symbol: &'a str,
    /// Link text that replaces the rendered symbol.
    pub text: Option<&'a str>,
}
