use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::namespace::NamespaceRule;
use crate::types::TagfileDescriptor;

/// Name of the project configuration file, looked up in the working directory.
pub const CONFIG_FILE: &str = ".cpptags.toml";

/// Key of the using-namespace array in the configuration file.
pub const USING_NAMESPACES_KEY: &str = "using-namespaces";

/// Project configuration loaded from `.cpptags.toml`.
/// Include/exclude patterns are path prefixes applied to the scanned documents.
#[derive(Debug)]
pub struct Config {
    /// Component name to documentation directory prefix.
    components: BTreeMap<String, String>,
    /// Whether the bundled cppreference tagfile is registered.
    pub cppreference: bool,
    exclude: Vec<String>,
    include: Vec<String>,
    /// Tagfiles in declared order, paths resolved against the config directory.
    pub tagfiles: Vec<TagfileDescriptor>,
    using_namespaces: Vec<NamespaceRule>,
}

/// Raw TOML structure for `.cpptags.toml`.
#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct CpptagsTomlConfig {
    #[serde(default)]
    components: BTreeMap<String, String>,
    #[serde(default = "enabled")]
    cppreference: bool,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    tagfiles: Vec<RawTagfile>,
    #[serde(default)]
    using_namespaces: Vec<RawUsingNamespace>,
}

/// The `external` flag as written: a TOML boolean or the strings "true"/"false".
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ExternalFlag {
    Bool(bool),
    Text(String),
}

/// One `[[tagfiles]]` entry as written.
#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawTagfile {
    base_url: String,
    component: Option<String>,
    external: Option<ExternalFlag>,
    file: PathBuf,
}

/// One `[[using-namespaces]]` entry as written.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RawUsingNamespace {
    component: Option<String>,
    namespace: String,
}

impl Config {
    /// The component whose documentation directory contains `relative_path`.
    /// The longest matching directory prefix wins.
    pub fn component_for(&self, relative_path: &str) -> Option<&str> {
        return self
            .components
            .iter()
            .filter(|(_, dir)| return relative_path.starts_with(dir.as_str()))
            .max_by_key(|(_, dir)| return dir.len())
            .map(|(name, _)| return name.as_str());
    }

    /// Default config: bundled cppreference index only, everything scanned.
    fn defaults() -> Self {
        return Self {
            components: BTreeMap::new(),
            cppreference: true,
            exclude: Vec::new(),
            include: Vec::new(),
            tagfiles: Vec::new(),
            using_namespaces: Vec::new(),
        };
    }

    /// Load config from `.cpptags.toml` in the given root directory.
    /// Returns the defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; never silently
    /// falls back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed,
    /// or `Error::ConfigInvalid` for values that parse but make no sense.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::defaults()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        let raw: CpptagsTomlConfig = toml::from_str(&content)?;
        return Self::from_raw(root, &path, raw);
    }

    /// Validate the raw TOML and resolve tagfile paths against `root`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigInvalid` for an unrecognized `external` value
    /// or an empty namespace.
    fn from_raw(root: &Path, path: &Path, raw: CpptagsTomlConfig) -> Result<Self, Error> {
        let invalid = |reason: String| {
            return Error::ConfigInvalid { path: path.to_path_buf(), reason };
        };

        let mut tagfiles = Vec::with_capacity(raw.tagfiles.len());
        for entry in raw.tagfiles {
            let external = match entry.external {
                None => entry.base_url.starts_with("http://") || entry.base_url.starts_with("https://"),
                Some(flag) => parse_external_flag(flag).ok_or_else(|| {
                    return invalid(format!(
                        "tagfile `{}`: `external` must be true or false",
                        entry.file.display()
                    ));
                })?,
            };
            tagfiles.push(TagfileDescriptor {
                base_url: entry.base_url,
                component: entry.component,
                external,
                file: root.join(entry.file),
            });
        }

        let mut using_namespaces = Vec::with_capacity(raw.using_namespaces.len());
        for entry in raw.using_namespaces {
            let namespace = entry.namespace.trim().trim_end_matches(':');
            if namespace.is_empty() {
                return Err(invalid(format!("`{USING_NAMESPACES_KEY}` entry has an empty namespace")));
            }
            using_namespaces.push(NamespaceRule::new(namespace, entry.component));
        }

        return Ok(Self {
            components: raw.components,
            cppreference: raw.cppreference,
            exclude: raw.exclude,
            include: raw.include,
            tagfiles,
            using_namespaces,
        });
    }

    /// Configured using-namespace rules in declared order, without the built-in rule.
    pub fn namespace_rules(&self) -> Vec<NamespaceRule> {
        return self.using_namespaces.clone();
    }

    /// Check whether a document path should be scanned.
    ///
    /// A path is included if no include patterns are set (scan everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}

/// Serde default for flags that are on unless disabled.
const fn enabled() -> bool {
    return true;
}

/// Interpret the `external` flag. `None` for strings other than "true"/"false".
fn parse_external_flag(flag: ExternalFlag) -> Option<bool> {
    return match flag {
        ExternalFlag::Bool(value) => Some(value),
        ExternalFlag::Text(text) => match text.trim() {
            "false" => Some(false),
            "true" => Some(true),
            _ => None,
        },
    };
}
