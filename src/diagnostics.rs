use std::fmt::Write as _;

use crate::config::{CONFIG_FILE, USING_NAMESPACES_KEY};
use crate::error::Error;

/// ANSI bold, used for headings.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
    return;
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where the user can
/// act on it, a "Fix" section.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::ConfigInvalid { path, reason } => render_config_invalid(&path.display().to_string(), reason),
        Error::ConfigNotFound { path } => render_config_not_found(&path.display().to_string()),
        Error::TagfileMalformed { path, reason } => render_tagfile_malformed(&path.display().to_string(), reason),
        Error::UnknownNamespace { component, namespace } => render_unknown_namespace(namespace, component.as_deref()),
        Error::UnresolvedSymbol { component, symbol } => render_unresolved_symbol(symbol, component.as_deref()),
        _ => render_generic(e),
    };
}

/// A config value that parsed but cannot be used.
fn render_config_invalid(path: &str, reason: &str) -> String {
    return format!(
        "\
# Error: Invalid Config

`{path}`: {reason}

## Fix

`external` accepts `true`, `false`, \"true\" or \"false\".
Every `[[{USING_NAMESPACES_KEY}]]` entry needs a non-empty `namespace`.
"
    );
}

/// An editing command ran without a config file.
fn render_config_not_found(path: &str) -> String {
    return format!(
        "\
# Error: Config Not Found

`{path}` does not exist.

## Fix

Create `{CONFIG_FILE}`, or add a rule first:

    cpptags using add <NAMESPACE>
"
    );
}

/// Errors with no dedicated advice.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::FileNotFound { path } => format!(
            "\
# Error: File Not Found

`{}` does not exist.
",
            path.display()
        ),
        Error::Io(e) => format!(
            "\
# Error: I/O

{e}
"
        ),
        Error::ParseFailed { file, reason } => format!(
            "\
# Error: Parse Failed

Could not parse `{}`: {reason}
",
            file.display()
        ),
        Error::TomlDe(e) => format!(
            "\
# Error: Invalid TOML

{e}
"
        ),
        // Already handled in render_error, but need exhaustive match.
        _ => format!(
            "\
# Error

{e}
"
        ),
    };
}

/// A tagfile that is not well-formed XML.
fn render_tagfile_malformed(path: &str, reason: &str) -> String {
    return format!(
        "\
# Error: Tagfile Malformed

`{path}` is not a well-formed tagfile: {reason}

The tagfile stays registered but contributes no links.

## Fix

Regenerate it with doxygen (`GENERATE_TAGFILE`).
"
    );
}

/// `using remove` named a rule that is not configured.
fn render_unknown_namespace(namespace: &str, component: Option<&str>) -> String {
    let mut out = format!(
        "\
# Error: Unknown Using-Namespace

No `[[{USING_NAMESPACES_KEY}]]` entry for `{namespace}`"
    );
    if let Some(component) = component {
        let _ = write!(out, " in component `{component}`");
    }
    out.push_str(
        ".

## Fix

List the configured rules:

    cpptags using list
",
    );
    return out;
}

/// A symbol no tagfile could link.
fn render_unresolved_symbol(symbol: &str, component: Option<&str>) -> String {
    let mut out = format!(
        "\
# Error: Unresolved Symbol

`{symbol}` matched no registered tagfile"
    );
    if let Some(component) = component {
        let _ = write!(out, " for component `{component}`");
    }
    out.push_str(
        ".

## Fix

Check which tagfiles are registered:

    cpptags tagfiles

Unqualified names are also tried under each using-namespace:

    cpptags using list
",
    );
    return out;
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn unresolved_symbol_names_component() {
        let md = render_error(&Error::UnresolvedSymbol {
            component: Some("url".to_string()),
            symbol: "url_view".to_string(),
        });
        assert!(md.starts_with("# Error: Unresolved Symbol"));
        assert!(md.contains("`url_view` matched no registered tagfile for component `url`."));
        assert!(md.contains("## Fix"));
    }

    #[test]
    fn unknown_namespace_without_component() {
        let md = render_error(&Error::UnknownNamespace { component: None, namespace: "boost::".to_string() });
        assert!(md.contains("entry for `boost::`.\n"));
    }

    #[test]
    fn config_not_found_suggests_using_add() {
        let md = render_error(&Error::ConfigNotFound { path: PathBuf::from(".cpptags.toml") });
        assert!(md.contains("cpptags using add"));
    }

    #[test]
    fn other_errors_fall_back_to_generic_block() {
        let md = render_error(&Error::FileNotFound { path: PathBuf::from("doc/missing.adoc") });
        assert_eq!(md, "# Error: File Not Found\n\n`doc/missing.adoc` does not exist.\n");
    }
}
