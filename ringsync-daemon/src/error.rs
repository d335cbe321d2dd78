use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Lifecycle phase a fatal error escaped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Startup,
    Reconciliation,
    GraphConstruction,
    Propagation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Startup => "startup",
            Phase::Reconciliation => "reconciliation",
            Phase::GraphConstruction => "graph construction",
            Phase::Propagation => "propagation",
        };
        f.write_str(name)
    }
}

/// Error surface for graph construction, propagation, and the event loop.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("config error: {0}")]
    Config(#[from] ringsync_core::ConfigError),

    #[error("sync error: {0}")]
    Sync(#[from] ringsync_sync::SyncError),

    #[error("failed to create notification source for {tracked}: {source}")]
    CreateSource {
        tracked: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to watch {path} (client {client}): {source}")]
    GraphBuild {
        client: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A fired watch matches no node of its group. The graph no longer
    /// reflects the live watch state.
    #[error("watch {watch} of group {group} matches no file node")]
    UnknownWatch { group: usize, watch: String },

    #[error("no surviving sibling to repair {path} from (tracked path {tracked})")]
    NoSurvivingSibling { tracked: String, path: PathBuf },

    #[error("failed to re-arm watch on {path}: {source}")]
    Rearm {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove watch on {path}: {source}")]
    Unwatch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read events for {tracked}: {source}")]
    Read {
        tracked: String,
        #[source]
        source: std::io::Error,
    },

    #[error("empty event read for {tracked}")]
    EmptyRead { tracked: String },

    #[error("waiting for change notifications failed: {0}")]
    Wait(#[source] std::io::Error),

    #[error("no notification backend is available on this platform")]
    Unsupported,

    #[error("{phase} failed: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<DaemonError>,
    },
}

impl DaemonError {
    /// Tag this error with the phase it escaped from.
    pub fn in_phase(self, phase: Phase) -> DaemonError {
        match self {
            already @ DaemonError::Phase { .. } => already,
            other => DaemonError::Phase {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// The phase this error was tagged with, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            DaemonError::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
