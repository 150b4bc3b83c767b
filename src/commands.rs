//! Core CLI commands for cpptags: resolve, render, check, tagfiles.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Serialize;
use tracing::debug;

use crate::config;
use crate::context::Context;
use crate::diagnostics;
use crate::error;
use crate::scanner::{self, MacroScanner};
use crate::types::LinkRequest;

/// `cpptags resolve --json` output.
#[derive(Serialize)]
struct ResolveOutput<'a> {
    /// Component the lookup was scoped to.
    component: Option<&'a str>,
    /// The link fragment, absent when unresolved.
    link: Option<&'a str>,
    /// What a page would show: the link, or the escaped fallback text.
    rendered: &'a str,
    /// The symbol as given on the command line.
    symbol: &'a str,
}

/// One row of `cpptags tagfiles --json`.
#[derive(Serialize)]
struct TagfileRow {
    /// URL prefix of the tagfile's pages.
    base_url: String,
    /// Component scope, `None` for global tagfiles.
    component: Option<String>,
    /// Number of compounds loaded, nested ones included.
    compounds: usize,
    /// Whether links open in a new window.
    external: bool,
    /// Where the tagfile was read from.
    file: String,
}

/// Resolve every macro of every scanned page and report the unresolved ones.
///
/// # Errors
///
/// Returns errors from config loading or page reading.
pub fn check() -> Result<ExitCode, error::Error> {
    let root = PathBuf::from(".");
    let config = config::Config::load(&root)?;
    let mut ctx = Context::from_config(&config);
    let documents = scanner::scan(&root, &config, &MacroScanner::new()?)?;

    let mut total = 0_usize;
    let mut unresolved = 0_usize;
    for document in &documents {
        for reference in &document.macros {
            total = total.saturating_add(1);
            let request = LinkRequest {
                component: document.component.as_deref(),
                symbol: &reference.target,
                text: reference.text.as_deref(),
            };
            if ctx.link(&request).is_none() {
                unresolved = unresolved.saturating_add(1);
                println!("UNRESOLVED {}:{} {}", document.path.display(), reference.line, reference.target);
            }
        }
    }

    log_cache_stats(&ctx);

    if unresolved > 0 {
        println!();
        println!("{unresolved} of {total} references unresolved");
        return Ok(ExitCode::FAILURE);
    }
    println!("All {total} references resolved");
    return Ok(ExitCode::SUCCESS);
}

/// Report how much lookup work the cache saved.
fn log_cache_stats(ctx: &Context) {
    let stats = ctx.cache_stats();
    debug!(entries = stats.entries, hits = stats.hits, misses = stats.misses, "result cache");
    return;
}

/// Print a page with every `cpp:` macro replaced by its link.
///
/// Without `--component`, the page's component comes from the configured
/// documentation directories.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if the page does not exist, or errors from
/// config loading.
pub fn render(file: &str, component: Option<&str>) -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let config = config::Config::load(&root)?;

    let path = Path::new(file);
    let content = std::fs::read_to_string(path)
        .map_err(|_err| return error::Error::FileNotFound { path: path.to_path_buf() })?;

    let relative = path.strip_prefix(".").unwrap_or(path).to_string_lossy().into_owned();
    let component = component.or_else(|| return config.component_for(&relative));
    debug!(file, component, "rendering");

    let mut ctx = Context::from_config(&config);
    let rendered = MacroScanner::new()?.render(&content, &mut ctx, component);
    print!("{rendered}");

    log_cache_stats(&ctx);
    return Ok(());
}

/// Resolve one symbol and print its link fragment.
///
/// An unresolved symbol prints the fallback text, a diagnostic on stderr,
/// and exits with status 1.
///
/// # Errors
///
/// Returns errors from config loading or JSON serialization.
pub fn resolve(symbol: &str, text: Option<&str>, component: Option<&str>, json: bool) -> Result<ExitCode, error::Error> {
    let root = PathBuf::from(".");
    let config = config::Config::load(&root)?;
    let mut ctx = Context::from_config(&config);

    let request = LinkRequest { component, symbol, text };
    let link = ctx.link(&request);
    let rendered = link.clone().unwrap_or_else(|| return scanner::fallback_text(&request));

    if json {
        let output = ResolveOutput { component, link: link.as_deref(), rendered: &rendered, symbol };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{rendered}");
    }

    if link.is_some() {
        return Ok(ExitCode::SUCCESS);
    }
    diagnostics::print_error(&error::Error::UnresolvedSymbol {
        component: component.map(str::to_string),
        symbol: symbol.to_string(),
    });
    return Ok(ExitCode::FAILURE);
}

/// List registered tagfiles in lookup order.
///
/// # Errors
///
/// Returns errors from config loading or JSON serialization.
pub fn tagfiles(json: bool) -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let config = config::Config::load(&root)?;
    let ctx = Context::from_config(&config);

    let rows: Vec<TagfileRow> = ctx
        .tagfiles()
        .iter()
        .map(|tagfile| {
            return TagfileRow {
                base_url: tagfile.base_url.clone(),
                component: tagfile.component.clone(),
                compounds: tagfile.tree.compound_count(),
                external: tagfile.external,
                file: tagfile.file.display().to_string(),
            };
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in &rows {
        let scope = row.component.as_deref().unwrap_or("global");
        let target = if row.external { "external" } else { "internal" };
        println!(
            "{}  [{scope}, {target}, {} compounds]  {}",
            row.file, row.compounds, row.base_url
        );
    }
    return Ok(());
}
