//! Symbol-to-link resolution across registered tagfiles.
//!
//! Resolution tries, in order: fundamental type keywords, include files,
//! plain (possibly qualified) names with using-namespace fallback, and finally
//! template instantiations, whose head, arguments and member suffix are each
//! resolved on their own.
use tracing::{trace, warn};

use crate::escape::encode;
use crate::fundamental::fundamental_type_target;
use crate::grammar::{is_include_file, is_template, split_symbol};
use crate::namespace::NamespacePolicy;
use crate::tagfile::Tagfile;

/// Recursion ceiling. Symbol nesting never comes close in real documents;
/// past it a branch is treated as unresolved.
const MAX_DEPTH: u32 = 64;

/// Stateless resolver over a set of tagfiles and using-namespace rules.
pub struct Resolver<'a> {
    /// Using-namespace rules tried when a first-pass lookup fails.
    namespaces: &'a NamespacePolicy,
    /// Tagfiles in lookup order.
    tagfiles: &'a [Tagfile],
}

/// The parts of a lookup that stay fixed while recursing into a symbol.
#[derive(Clone, Copy)]
struct Scope<'s> {
    /// Component whose tagfiles and rules apply.
    component: Option<&'s str>,
    /// Namespace prefix prepended to plain names. Empty on the first pass.
    namespace: &'s str,
}

impl<'a> Resolver<'a> {
    /// Tagfiles consulted for a component, in registration order.
    fn applicable(&self, component: Option<&'a str>) -> impl Iterator<Item = &'a Tagfile> {
        return self.tagfiles.iter().filter(move |tagfile| return tagfile.applies_to(component));
    }

    /// Link an include file such as `<algorithm>` through the first tagfile that knows it.
    fn link_include_file(&self, symbol: &str, text: Option<&str>, component: Option<&'a str>) -> Option<String> {
        return self.applicable(component).find_map(|tagfile| {
            let path = tagfile.lookup_include_file(symbol)?;
            return Some(tagfile.format_link(&path, &link_text(symbol, text)));
        });
    }

    /// Link a name without template arguments.
    ///
    /// On the first pass (empty namespace) a miss retries the whole
    /// resolution under each applicable using-namespace, in policy order.
    fn link_name(&self, symbol: &str, text: Option<&str>, scope: Scope<'a>, depth: u32) -> Option<String> {
        let qualified = format!("{}{symbol}", scope.namespace);
        let direct = self.applicable(scope.component).find_map(|tagfile| {
            let path = tagfile.lookup_symbol(&qualified)?;
            trace!(symbol = %qualified, file = %tagfile.file.display(), "matched");
            return Some(tagfile.format_link(&path, &link_text(symbol, text)));
        });
        if direct.is_some() || !scope.namespace.is_empty() {
            return direct;
        }

        let next = depth.saturating_add(1);
        return self.namespaces.applicable(scope.component).find_map(|rule| {
            let retry = Scope { component: scope.component, namespace: rule.prefix.as_str() };
            return self.resolve_in(symbol, text, retry, next);
        });
    }

    /// Link a template instantiation piece by piece.
    ///
    /// With a link text override only the head is linked, under that text.
    fn link_template(&self, symbol: &str, text: Option<&str>, scope: Scope<'a>, depth: u32) -> Option<String> {
        let split = split_symbol(symbol);
        let next = depth.saturating_add(1);

        let head = self.resolve_in(&split.head, text, scope, next);
        if text.is_some() {
            return head;
        }

        let mut out = head.unwrap_or_else(|| return encode(&split.head));
        out.push_str(&encode("<"));
        for (idx, argument) in split.template_args.iter().enumerate() {
            if idx > 0 {
                out.push_str(&encode(", "));
            }
            let linked = self.resolve_in(argument, None, scope, next);
            out.push_str(&linked.unwrap_or_else(|| return encode(argument)));
        }
        out.push_str(&encode(">"));

        match split.suffix.strip_prefix("::") {
            None => out.push_str(&encode(&split.suffix)),
            Some(member) => {
                out.push_str(&encode("::"));
                let nested = format!("{}{}", split.head, split.suffix);
                let linked = self.resolve_in(&nested, None, scope, next);
                out.push_str(&linked.unwrap_or_else(|| return encode(member)));
            },
        }

        return Some(out);
    }

    /// Create a resolver over tagfiles (in lookup order) and a namespace policy.
    pub const fn new(tagfiles: &'a [Tagfile], namespaces: &'a NamespacePolicy) -> Self {
        return Self { namespaces, tagfiles };
    }

    /// Resolve a decoded symbol for a component.
    ///
    /// Returns the link fragment, or `None` when nothing matched; callers then
    /// render the symbol (or `text`) unlinked.
    pub fn resolve(&self, symbol: &str, text: Option<&str>, component: Option<&'a str>) -> Option<String> {
        return self.resolve_in(symbol, text, Scope { component, namespace: "" }, 0);
    }

    /// One level of the recursive resolution.
    fn resolve_in(&self, symbol: &str, text: Option<&str>, scope: Scope<'a>, depth: u32) -> Option<String> {
        if depth > MAX_DEPTH {
            warn!(symbol, "resolution depth limit reached");
            return None;
        }

        if let Some(target) = fundamental_type_target(symbol) {
            return Some(format!("{target}[{},window=\"_blank\"]", link_text(symbol, text)));
        }

        if is_include_file(symbol) {
            return self.link_include_file(symbol, text, scope.component);
        }

        if !is_template(symbol) {
            return self.link_name(symbol, text, scope, depth);
        }

        return self.link_template(symbol, text, scope, depth);
    }
}

/// The override text as given, or the escaped symbol.
fn link_text(symbol: &str, text: Option<&str>) -> String {
    return text.map_or_else(|| return encode(symbol), str::to_string);
}
