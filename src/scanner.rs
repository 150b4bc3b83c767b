use std::path::{Path, PathBuf};

use regex::{Captures, Regex};
use walkdir::WalkDir;

use crate::config::Config;
use crate::context::Context;
use crate::error::Error;
use crate::escape;
use crate::types::{LinkRequest, MacroRef};

/// Inline `cpp:<target>[<text>]` macro. The target stops at whitespace or a bracket.
const MACRO_PATTERN: &str = r"\bcpp:([^\[\]\s]+)\[([^\]]*)\]";

/// An AsciiDoc page and the macros found in it.
#[derive(Debug)]
pub struct Document {
    /// Component whose documentation directory holds the page.
    pub component: Option<String>,
    /// Macros in document order.
    pub macros: Vec<MacroRef>,
    /// Path relative to the scan root.
    pub path: PathBuf,
}

/// Finds and rewrites `cpp:` macros.
pub struct MacroScanner {
    /// Compiled `MACRO_PATTERN`.
    pattern: Regex,
}

impl MacroScanner {
    /// Extract all macros from page content, with one-based line numbers.
    pub fn extract(&self, content: &str) -> Vec<MacroRef> {
        let mut found = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let number = u32::try_from(idx.saturating_add(1)).unwrap_or(u32::MAX);
            for cap in self.pattern.captures_iter(line) {
                found.push(macro_from_capture(&cap, number));
            }
        }
        return found;
    }

    /// Compile the macro pattern.
    ///
    /// # Errors
    ///
    /// Returns `Error::Pattern` if the pattern does not compile.
    pub fn new() -> Result<Self, Error> {
        return Ok(Self { pattern: Regex::new(MACRO_PATTERN)? });
    }

    /// Replace every macro with a monospaced link, or with the monospaced
    /// escaped fallback text when the symbol is unresolved.
    /// Text outside macros is left untouched.
    pub fn render(&self, content: &str, ctx: &mut Context, component: Option<&str>) -> String {
        let rendered = self.pattern.replace_all(content, |cap: &Captures<'_>| {
            let reference = macro_from_capture(cap, 0);
            let request = LinkRequest {
                component,
                symbol: &reference.target,
                text: reference.text.as_deref(),
            };
            let shown = ctx.link(&request).unwrap_or_else(|| return fallback_text(&request));
            return format!("`{shown}`");
        });
        return rendered.into_owned();
    }
}

/// What an unresolved macro renders as: the override verbatim, or the
/// decoded symbol escaped again.
pub fn fallback_text(request: &LinkRequest<'_>) -> String {
    return match request.text {
        None => escape::encode(&escape::decode(request.symbol)),
        Some(text) => text.to_string(),
    };
}

/// Build a macro reference from a pattern capture.
fn macro_from_capture(cap: &Captures<'_>, line: u32) -> MacroRef {
    let target = cap.get(1).map_or("", |m| return m.as_str());
    let text = cap.get(2).map(|m| return m.as_str()).filter(|t| return !t.is_empty());
    return MacroRef {
        line,
        text: text.map(str::to_string),
        target: target.to_string(),
    };
}

/// Scan all AsciiDoc pages under `root` and extract their macros.
/// Applies the config's include/exclude filters and assigns each page its
/// component. Pages are returned sorted by path; pages without macros are kept.
///
/// # Errors
///
/// Returns `Error::Io` if any page cannot be read.
pub fn scan(root: &Path, config: &Config, scanner: &MacroScanner) -> Result<Vec<Document>, Error> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| return e.path().extension().is_some_and(|ext| return ext == "adoc"))
    {
        let page = entry.path();
        let relative = page.strip_prefix(root).unwrap_or(page).to_path_buf();
        let relative_str = relative.to_string_lossy();
        if !config.should_scan(&relative_str) {
            continue;
        }

        let content = std::fs::read_to_string(page)?;
        documents.push(Document {
            component: config.component_for(&relative_str).map(str::to_string),
            macros: scanner.extract(&content),
            path: relative,
        });
    }

    return Ok(documents);
}
