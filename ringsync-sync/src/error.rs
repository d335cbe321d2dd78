//! Error types for ringsync-sync.

use std::path::PathBuf;

use thiserror::Error;

use ringsync_core::error::ConfigError;

/// All errors that can arise from probing, replication, and reconciliation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from configuration loading.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external copy program could not be started.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external copy program ran but did not succeed.
    #[error("{program} {source_path} -> {dest}: {status}")]
    CommandFailed {
        program: PathBuf,
        source_path: PathBuf,
        dest: PathBuf,
        status: String,
    },

    /// A tracked path exists in no client, so there is nothing to copy from.
    #[error("no surviving copy of {tracked} in any client")]
    NoSurvivingCopy { tracked: String },

    /// A scope named a path that is not in the watch list.
    #[error("{tracked} is not a tracked path")]
    UnknownTrackedPath { tracked: String },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
