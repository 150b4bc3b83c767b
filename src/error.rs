/// Crate-level error types for cpptags diagnostics.
use std::path::PathBuf;

/// All errors in cpptags carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, symbol, or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration file parsed but holds a value cpptags cannot use.
    #[error("invalid config {}: {reason}", path.display())]
    ConfigInvalid {
        /// Path to the offending config file.
        path: PathBuf,
        /// Description of the invalid value.
        reason: String,
    },

    /// A config file that must exist (for editing commands) is missing.
    #[error("config not found: {}", path.display())]
    ConfigNotFound {
        /// Path to the missing config file.
        path: PathBuf,
    },

    /// A document named on the command line does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of command output failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// The config file could not be parsed for format-preserving editing.
    #[error("parse failed: {}: {reason}", file.display())]
    ParseFailed {
        /// File that failed to parse.
        file: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// The macro pattern failed to compile.
    #[error("pattern: {0}")]
    Pattern(
        /// The wrapped regex error.
        #[from]
        regex::Error,
    ),

    /// A tagfile exists but is not well-formed XML.
    #[error("tagfile malformed: {}: {reason}", path.display())]
    TagfileMalformed {
        /// Path to the tagfile.
        path: PathBuf,
        /// Description of the XML error.
        reason: String,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// No using-namespace rule matches the one named for removal.
    #[error("unknown using-namespace: `{namespace}`")]
    UnknownNamespace {
        /// Component scope of the rule, if any.
        component: Option<String>,
        /// Namespace prefix that was not found.
        namespace: String,
    },

    /// A symbol could not be linked against any registered tagfile.
    #[error("unresolved symbol: `{symbol}`")]
    UnresolvedSymbol {
        /// Component the lookup was scoped to, if any.
        component: Option<String>,
        /// The decoded symbol text.
        symbol: String,
    },
}
