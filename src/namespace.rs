//! Implicit using-namespace rules and the `cpptags using` commands that edit them.
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config;
use crate::error;

/// Always tried last: symbols such as `string_view` resolve as `std::string_view`.
pub const BUILTIN_NAMESPACE: &str = "std::";

/// A namespace whose members may be referenced unqualified, like a
/// `using namespace` directive in the documented code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRule {
    /// Component the rule is restricted to. `None` applies everywhere.
    pub component: Option<String>,
    /// The namespace, always ending in `::`.
    pub prefix: String,
}

/// The ordered using-namespace rules of a run.
///
/// Configured rules keep their declared order; the built-in `std::` rule is
/// appended after them. Duplicate (prefix, component) pairs keep their first
/// position.
#[derive(Debug, Clone)]
pub struct NamespacePolicy {
    /// Rules in the order they are tried.
    rules: Vec<NamespaceRule>,
}

impl NamespaceRule {
    /// Whether lookups scoped to `component` try this rule.
    pub fn applies_to(&self, component: Option<&str>) -> bool {
        return match self.component.as_deref() {
            None => true,
            Some(own) => component == Some(own),
        };
    }

    /// Create a rule, normalizing the namespace to end in `::`.
    pub fn new(namespace: &str, component: Option<String>) -> Self {
        return Self { component, prefix: normalize_prefix(namespace) };
    }
}

impl NamespacePolicy {
    /// Rules applicable to `component`, in the order they are tried.
    pub fn applicable<'a>(&'a self, component: Option<&'a str>) -> impl Iterator<Item = &'a NamespaceRule> {
        return self.rules.iter().filter(move |rule| return rule.applies_to(component));
    }

    /// Build the policy from configured rules, appending the built-in rule.
    pub fn new(configured: impl IntoIterator<Item = NamespaceRule>) -> Self {
        let mut rules: Vec<NamespaceRule> = Vec::new();
        let builtin = NamespaceRule::new(BUILTIN_NAMESPACE, None);
        for rule in configured.into_iter().chain(std::iter::once(builtin)) {
            if rules.contains(&rule) {
                warn!(prefix = %rule.prefix, component = ?rule.component, "duplicate using-namespace ignored");
                continue;
            }
            rules.push(rule);
        }
        return Self { rules };
    }

    /// All rules, in the order they are tried.
    pub fn rules(&self) -> &[NamespaceRule] {
        return &self.rules;
    }
}

/// Append `::` unless the namespace already ends with it.
pub fn normalize_prefix(namespace: &str) -> String {
    let trimmed = namespace.trim();
    if trimmed.ends_with("::") {
        return trimmed.to_string();
    }
    return format!("{trimmed}::");
}

// ── CLI commands ──────────────────────────────────────────────────────

/// Add a using-namespace rule to the config file.
///
/// # Errors
///
/// Returns errors from config reading or writing.
pub fn cmd_add(namespace: &str, component: Option<&str>) -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    add_to_config(&root, namespace, component)?;
    println!("Added using-namespace: {}{}", normalize_prefix(namespace), component_suffix(component));
    return Ok(());
}

/// List the using-namespace rules in the order they are tried.
///
/// # Errors
///
/// Returns errors from config loading.
pub fn cmd_list() -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let config = config::Config::load(&root)?;
    let policy = NamespacePolicy::new(config.namespace_rules());

    for rule in policy.rules() {
        println!("{}{}", rule.prefix, component_suffix(rule.component.as_deref()));
    }

    return Ok(());
}

/// Remove a using-namespace rule from the config file.
///
/// # Errors
///
/// Returns `Error::ConfigNotFound` if there is no config file,
/// or `Error::UnknownNamespace` if no rule matches.
pub fn cmd_remove(namespace: &str, component: Option<&str>) -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    remove_from_config(&root, namespace, component)?;
    println!("Removed using-namespace: {}{}", normalize_prefix(namespace), component_suffix(component));
    return Ok(());
}

// ── Config file editing ───────────────────────────────────────────────

/// Append a `[[using-namespaces]]` entry to `.cpptags.toml`.
/// Creates the file and the array if they don't exist.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if the config can't be parsed,
/// or `Error::Io` if writing fails.
fn add_to_config(root: &Path, namespace: &str, component: Option<&str>) -> Result<(), error::Error> {
    let (config_path, mut doc) = read_config_doc(root)?;

    if !doc.contains_key(config::USING_NAMESPACES_KEY) {
        doc[config::USING_NAMESPACES_KEY] = toml_edit::Item::ArrayOfTables(toml_edit::ArrayOfTables::new());
    }
    let Some(rules) = doc[config::USING_NAMESPACES_KEY].as_array_of_tables_mut() else {
        return Err(error::Error::ParseFailed {
            file: config_path,
            reason: format!("`{}` is not an array of tables", config::USING_NAMESPACES_KEY),
        });
    };

    let mut entry = toml_edit::Table::new();
    entry["namespace"] = toml_edit::value(namespace.trim());
    if let Some(component) = component {
        entry["component"] = toml_edit::value(component);
    }
    rules.push(entry);

    std::fs::write(&config_path, doc.to_string())?;
    return Ok(());
}

/// Render ` (component)` for scoped rules, nothing for global ones.
fn component_suffix(component: Option<&str>) -> String {
    return component.map(|c| return format!(" ({c})")).unwrap_or_default();
}

/// Parse `.cpptags.toml` into a format-preserving document.
/// Returns an empty document if the file doesn't exist.
///
/// # Errors
///
/// Returns `Error::Io` on read failure or `Error::ParseFailed` on parse failure.
fn read_config_doc(root: &Path) -> Result<(PathBuf, toml_edit::DocumentMut), error::Error> {
    let config_path = root.join(config::CONFIG_FILE);
    let content = match std::fs::read_to_string(&config_path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(error::Error::Io(e)),
        Ok(c) => c,
    };

    let doc: toml_edit::DocumentMut = content.parse().map_err(|e: toml_edit::TomlError| {
        return error::Error::ParseFailed {
            file: config_path.clone(),
            reason: e.to_string(),
        };
    })?;

    return Ok((config_path, doc));
}

/// Remove the `[[using-namespaces]]` entry matching a namespace and component.
///
/// # Errors
///
/// Returns `Error::ConfigNotFound` if `.cpptags.toml` is missing,
/// or `Error::UnknownNamespace` if no entry matches.
fn remove_from_config(root: &Path, namespace: &str, component: Option<&str>) -> Result<(), error::Error> {
    let config_path = root.join(config::CONFIG_FILE);
    if !config_path.exists() {
        return Err(error::Error::ConfigNotFound { path: config_path });
    }
    let (config_path, mut doc) = read_config_doc(root)?;

    let unknown = || {
        return error::Error::UnknownNamespace {
            component: component.map(str::to_string),
            namespace: namespace.to_string(),
        };
    };

    let rules = doc
        .get_mut(config::USING_NAMESPACES_KEY)
        .and_then(toml_edit::Item::as_array_of_tables_mut)
        .ok_or_else(unknown)?;

    let wanted = normalize_prefix(namespace);
    let position = rules
        .iter()
        .position(|entry| {
            let entry_namespace = entry.get("namespace").and_then(toml_edit::Item::as_str);
            let entry_component = entry.get("component").and_then(toml_edit::Item::as_str);
            return entry_namespace.map(normalize_prefix).as_deref() == Some(wanted.as_str())
                && entry_component == component;
        })
        .ok_or_else(unknown)?;

    rules.remove(position);
    std::fs::write(&config_path, doc.to_string())?;
    return Ok(());
}
