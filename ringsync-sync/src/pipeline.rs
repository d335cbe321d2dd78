//! Shared reconciliation entrypoint used by CLI and daemon.

use ringsync_core::ResolvedConfig;

use crate::{reconcile_all, reconcile_path, PathReconciliation, Replicator, SyncError};

/// Scope for a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileScope {
    /// Reconcile every tracked path.
    All,
    /// Reconcile a single tracked path.
    Path(String),
}

/// Run reconciliation for a scope.
///
/// This is the canonical entrypoint for both `ringsync reconcile` and the
/// daemon's startup pass.
pub fn run(
    config: &ResolvedConfig,
    replicator: &dyn Replicator,
    scope: ReconcileScope,
    dry_run: bool,
) -> Result<Vec<PathReconciliation>, SyncError> {
    match scope {
        ReconcileScope::All => reconcile_all(&config.clients, &config.tracked, replicator, dry_run),
        ReconcileScope::Path(path) => {
            let tracked = config
                .tracked
                .find(&path)
                .ok_or(SyncError::UnknownTrackedPath { tracked: path.clone() })?;
            Ok(vec![reconcile_path(
                &config.clients,
                tracked,
                replicator,
                dry_run,
            )?])
        }
    }
}
