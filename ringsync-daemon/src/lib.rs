//! ringsync daemon: the File Graph, change propagation, and the event loop.
//!
//! [`Mirror`] owns a [`Notifier`], the [`FileGraph`] built over it, and the
//! replicator. [`start_blocking`] runs the whole lifecycle for the binary.

mod error;
#[cfg(test)]
mod fake;
pub mod graph;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub mod inotify;
pub mod mirror;
pub mod notifier;
mod runtime;
#[cfg(test)]
mod test_support;

pub use error::{DaemonError, Phase};
pub use graph::{FileGraph, FileNode, GroupId, MonitoringGroup, NodeId};
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use inotify::InotifyNotifier;
pub use mirror::{Mirror, Propagation};
pub use notifier::{ChangeEvent, ChangeKind, Notifier};
pub use runtime::{init_tracing, run, start_blocking, LogFormat};
