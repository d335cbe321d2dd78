//! Error types for ringsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, annotated with the file being read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with the file path and serde_yaml's line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The configuration file did not exist at the expected path.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    /// A plain-text client table or watch list is structurally broken.
    #[error("malformed {path} (line {line}): {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("no clients configured")]
    NoClients,

    #[error("no tracked paths configured")]
    NoTrackedPaths,

    #[error("client name must not be empty")]
    EmptyClientName,

    #[error("client '{name}' is listed more than once")]
    DuplicateClient { name: String },

    /// Two clients would hold the same copy of every tracked path.
    #[error("clients '{first}' and '{second}' share the root '{root}'")]
    DuplicateClientRoot {
        first: String,
        second: String,
        root: String,
    },

    #[error("client '{name}' has an invalid root '{root}': {reason}")]
    InvalidClientRoot {
        name: String,
        root: String,
        reason: &'static str,
    },

    #[error("tracked path '{path}' is invalid: {reason}")]
    InvalidTrackedPath { path: String, reason: &'static str },

    #[error("tracked path '{path}' is listed more than once")]
    DuplicateTrackedPath { path: String },
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
