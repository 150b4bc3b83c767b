//! The restricted C++ symbol grammar used by `cpp:` cross-reference macros:
//! plain and qualified names, bracketed template argument lists, and
//! include-file names in quotes or angle brackets.

/// A symbol decomposed around its outermost template argument list.
///
/// `std::vector<int>::iterator` splits into head `std::vector`, arguments
/// `["int"]` and suffix `::iterator`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSymbol {
    /// Everything before the first `<`.
    pub head: String,
    /// Everything after the `>` closing the outermost list, untouched.
    pub suffix: String,
    /// Top-level arguments, trimmed. Nested lists are kept verbatim.
    pub template_args: Vec<String>,
}

/// Whether a symbol names a header: `"file.hpp"` or `<algorithm>`.
pub fn is_include_file(symbol: &str) -> bool {
    if symbol.len() < 2 {
        return false;
    }
    return (symbol.starts_with('"') && symbol.ends_with('"'))
        || (symbol.starts_with('<') && symbol.ends_with('>'));
}

/// Whether a symbol carries a template argument list.
pub fn is_template(symbol: &str) -> bool {
    return symbol.contains('<');
}

/// Push the pending argument buffer, trimmed, if it holds anything.
fn flush_argument(current: &mut String, template_args: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    template_args.push(current.trim().to_string());
    current.clear();
}

/// Split a symbol into head, top-level template arguments, and suffix.
///
/// This is a single scan with a nesting counter, not a validating parser.
/// Unbalanced brackets produce a partial split rather than an error; a
/// stray `>` never drives the counter below zero.
pub fn split_symbol(symbol: &str) -> SplitSymbol {
    let mut split = SplitSymbol::default();
    let mut current = String::new();
    let mut level: u32 = 0;
    let mut in_template_args = false;

    for (idx, c) in symbol.char_indices() {
        match c {
            '<' => {
                in_template_args = true;
                level = level.saturating_add(1);
            },
            '>' => level = level.saturating_sub(1),
            _ => {},
        }

        if level == 0 {
            if !in_template_args {
                split.head.push(c);
                continue;
            }
            let rest_start = idx.saturating_add(c.len_utf8());
            split.suffix = symbol.get(rest_start..).unwrap_or_default().to_string();
            break;
        }

        if level == 1 && matches!(c, ',' | '<' | '>') {
            // A `>` seen here closes a nested list that belongs to the argument.
            if c == '>' && !current.is_empty() {
                current.push(c);
            }
            flush_argument(&mut current, &mut split.template_args);
            continue;
        }

        current.push(c);
    }

    flush_argument(&mut current, &mut split.template_args);
    return split;
}
