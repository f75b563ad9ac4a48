//! Error types for pipeline operations.
//!
//! Distinguishes "handled abort" failures (a diagnostic was already shown to
//! the user) from every other propagating failure, so the top-level runner
//! never double-reports.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, DistError>;

/// Main error type for all pipeline operations
#[derive(Error, Debug)]
pub enum DistError {
    /// A user-facing diagnostic was already printed; the run just stops.
    ///
    /// The top-level runner exits without printing anything further.
    #[error("aborted after a previously reported error")]
    AlreadyReported,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed version strings; never silently skipped
    #[error("invalid version `{input}`: {source}")]
    Version {
        /// Version string as given by the caller
        input: String,
        /// Underlying semver parse failure
        source: semver::Error,
    },

    /// Project descriptor problems
    #[error("configuration error: {reason}")]
    Config {
        /// Reason for the error
        reason: String,
    },

    /// Plugin identifier did not resolve to an implementation
    #[error("plugin not found: {name}")]
    PluginNotFound {
        /// Fully resolved plugin identifier
        name: String,
    },

    /// Template registration or rendering failures
    #[error("template error: {0}")]
    Template(String),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),

    /// Other errors carrying only a message
    #[error("{0}")]
    Generic(String),
}

/// Early-return with a [`DistError::Generic`] built from format arguments.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::error::DistError::Generic(format!($($arg)*)))
    };
}
