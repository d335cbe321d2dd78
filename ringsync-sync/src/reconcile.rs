//! Startup reconciliation.
//!
//! For each tracked path the newest existing copy (strictly greatest
//! modification time, first client in table order on ties) becomes the
//! canonical copy and is replicated over every client whose copy is missing
//! or strictly older. Copies already at the canonical timestamp are left
//! alone, so a second pass right after the first replicates nothing.

use std::path::PathBuf;
use std::time::SystemTime;

use ringsync_core::{ClientName, ClientTable, TrackedPath, WatchList};

use crate::error::SyncError;
use crate::probe::{modified, probe};
use crate::replicator::Replicator;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome for one client's copy of a tracked path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaResult {
    /// This copy was chosen as the source of truth.
    Canonical { client: ClientName, path: PathBuf },
    /// The copy was missing or older and has been replaced.
    Replicated { client: ClientName, path: PathBuf },
    /// Dry run: the copy *would* have been replaced.
    WouldReplicate { client: ClientName, path: PathBuf },
    /// The copy already carries the canonical timestamp.
    Unchanged { client: ClientName, path: PathBuf },
}

impl ReplicaResult {
    pub fn client(&self) -> &ClientName {
        match self {
            ReplicaResult::Canonical { client, .. }
            | ReplicaResult::Replicated { client, .. }
            | ReplicaResult::WouldReplicate { client, .. }
            | ReplicaResult::Unchanged { client, .. } => client,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self,
            ReplicaResult::Replicated { .. } | ReplicaResult::WouldReplicate { .. }
        )
    }
}

/// Outcome of reconciling a single tracked path.
#[derive(Debug, Clone)]
pub struct PathReconciliation {
    pub tracked: TrackedPath,
    pub canonical: ClientName,
    pub replicas: Vec<ReplicaResult>,
}

impl PathReconciliation {
    pub fn writes(&self) -> usize {
        self.replicas.iter().filter(|r| r.is_write()).count()
    }
}

// ---------------------------------------------------------------------------
// reconcile_path
// ---------------------------------------------------------------------------

struct Candidate {
    client: ClientName,
    path: PathBuf,
    mtime: Option<SystemTime>,
}

/// Reconcile every client's copy of `tracked`.
///
/// Fails with [`SyncError::NoSurvivingCopy`] if no client has the file, and
/// with [`SyncError::Io`] if a probe fails for any reason other than
/// "not found".
pub fn reconcile_path(
    clients: &ClientTable,
    tracked: &TrackedPath,
    replicator: &dyn Replicator,
    dry_run: bool,
) -> Result<PathReconciliation, SyncError> {
    let mut candidates = Vec::with_capacity(clients.len());
    for client in clients {
        let path = client.resolve(tracked);
        let mtime = match probe(&path)? {
            Some(meta) => Some(modified(&path, &meta)?),
            None => {
                tracing::info!("{} does not exist in client {}", path.display(), client.name);
                None
            }
        };
        candidates.push(Candidate {
            client: client.name.clone(),
            path,
            mtime,
        });
    }

    let (canonical_idx, canonical_mtime) =
        pick_canonical(&candidates).ok_or_else(|| SyncError::NoSurvivingCopy {
            tracked: tracked.0.clone(),
        })?;
    let canonical = &candidates[canonical_idx];
    tracing::debug!(
        "{} has the latest modification time for {}",
        canonical.path.display(),
        tracked
    );

    let mut replicas = Vec::with_capacity(candidates.len());
    for (idx, candidate) in candidates.iter().enumerate() {
        let client = candidate.client.clone();
        let path = candidate.path.clone();
        if idx == canonical_idx {
            replicas.push(ReplicaResult::Canonical { client, path });
            continue;
        }
        let stale = match candidate.mtime {
            None => true,
            Some(mtime) => mtime < canonical_mtime,
        };
        if !stale {
            replicas.push(ReplicaResult::Unchanged { client, path });
        } else if dry_run {
            tracing::info!(
                "[dry-run] would replicate {} -> {}",
                canonical.path.display(),
                path.display()
            );
            replicas.push(ReplicaResult::WouldReplicate { client, path });
        } else {
            replicator.replicate(&canonical.path, &path)?;
            replicas.push(ReplicaResult::Replicated { client, path });
        }
    }

    Ok(PathReconciliation {
        tracked: tracked.clone(),
        canonical: canonical.client.clone(),
        replicas,
    })
}

/// Index and mtime of the newest existing candidate; earliest wins ties.
fn pick_canonical(candidates: &[Candidate]) -> Option<(usize, SystemTime)> {
    let mut best: Option<(usize, SystemTime)> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        let Some(mtime) = candidate.mtime else {
            continue;
        };
        match best {
            Some((_, newest)) if mtime <= newest => {}
            _ => best = Some((idx, mtime)),
        }
    }
    best
}

// ---------------------------------------------------------------------------
// reconcile_all
// ---------------------------------------------------------------------------

/// Reconcile every tracked path in watch list order, stopping at the first
/// failure.
pub fn reconcile_all(
    clients: &ClientTable,
    tracked: &WatchList,
    replicator: &dyn Replicator,
    dry_run: bool,
) -> Result<Vec<PathReconciliation>, SyncError> {
    let mut results = Vec::with_capacity(tracked.len());
    for path in tracked {
        results.push(reconcile_path(clients, path, replicator, dry_run)?);
    }
    Ok(results)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn candidate(name: &str, secs: Option<u64>) -> Candidate {
        Candidate {
            client: ClientName::from(name),
            path: PathBuf::from(format!("/{name}")),
            mtime: secs.map(|s| SystemTime::UNIX_EPOCH + Duration::from_secs(s)),
        }
    }

    #[test]
    fn newest_copy_wins() {
        let c = [candidate("a", Some(5)), candidate("b", Some(10)), candidate("c", None)];
        assert_eq!(pick_canonical(&c).map(|(idx, _)| idx), Some(1));
    }

    #[test]
    fn ties_resolve_to_first_in_table_order() {
        let c = [candidate("a", None), candidate("b", Some(7)), candidate("c", Some(7))];
        assert_eq!(pick_canonical(&c).map(|(idx, _)| idx), Some(1));
    }

    #[test]
    fn nothing_exists_means_no_canonical() {
        let c = [candidate("a", None), candidate("b", None)];
        assert!(pick_canonical(&c).is_none());
    }

    #[test]
    fn epoch_mtime_still_counts_as_existing() {
        let c = [candidate("a", Some(0)), candidate("b", None)];
        assert_eq!(pick_canonical(&c).map(|(idx, _)| idx), Some(0));
    }
}
