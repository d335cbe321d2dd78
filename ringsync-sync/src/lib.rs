//! # ringsync-sync
//!
//! Replication primitives and the startup reconciliation pass.
//!
//! Call [`reconcile_all`] to bring every client copy of every tracked path
//! to the newest copy, or [`reconcile_path`] for a single tracked path.
//! [`consistency::check`] reports drift without touching anything.

pub mod consistency;
pub mod error;
pub mod pipeline;
pub mod probe;
pub mod reconcile;
pub mod replicator;

pub use consistency::{ConsistencySignal, CopyState, PathConsistency};
pub use error::SyncError;
pub use probe::probe;
pub use reconcile::{reconcile_all, reconcile_path, PathReconciliation, ReplicaResult};
pub use replicator::{from_kind, CommandReplicator, CopyReplicator, Replicator};
