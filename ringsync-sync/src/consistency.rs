//! Read-only consistency report across client copies.
//!
//! Signal precedence per tracked path:
//! 1. `Absent` (no client has the file)
//! 2. `Missing` (some clients lack the file)
//! 3. `Diverged` (content digests differ)
//! 4. `Consistent`

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use ringsync_core::{ClientName, ClientTable, TrackedPath, WatchList};

use crate::error::{io_err, SyncError};
use crate::probe::{modified, probe};

/// Classification of one tracked path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConsistencySignal {
    Consistent,
    /// Clients whose content differs from the newest copy.
    Diverged { clients: Vec<ClientName> },
    /// Clients without a copy.
    Missing { clients: Vec<ClientName> },
    Absent,
}

/// What one client holds for a tracked path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyState {
    pub client: ClientName,
    pub path: PathBuf,
    /// `None` when the copy does not exist.
    pub digest: Option<String>,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
}

/// Report for one tracked path.
#[derive(Debug, Clone, Serialize)]
pub struct PathConsistency {
    pub tracked: TrackedPath,
    pub signal: ConsistencySignal,
    pub copies: Vec<CopyState>,
}

/// Inspect every copy of every tracked path.
pub fn check(clients: &ClientTable, tracked: &WatchList) -> Result<Vec<PathConsistency>, SyncError> {
    tracked.iter().map(|path| check_path(clients, path)).collect()
}

/// Inspect every client's copy of one tracked path.
pub fn check_path(clients: &ClientTable, tracked: &TrackedPath) -> Result<PathConsistency, SyncError> {
    let mut copies = Vec::with_capacity(clients.len());
    for client in clients {
        let path = client.resolve(tracked);
        let state = match probe(&path)? {
            Some(meta) => CopyState {
                client: client.name.clone(),
                digest: Some(hash_file(&path)?),
                size: Some(meta.len()),
                modified: Some(DateTime::<Utc>::from(modified(&path, &meta)?)),
                path,
            },
            None => CopyState {
                client: client.name.clone(),
                path,
                digest: None,
                size: None,
                modified: None,
            },
        };
        copies.push(state);
    }

    Ok(PathConsistency {
        tracked: tracked.clone(),
        signal: classify(&copies),
        copies,
    })
}

fn classify(copies: &[CopyState]) -> ConsistencySignal {
    let missing: Vec<ClientName> = copies
        .iter()
        .filter(|c| c.digest.is_none())
        .map(|c| c.client.clone())
        .collect();
    if missing.len() == copies.len() {
        return ConsistencySignal::Absent;
    }
    if !missing.is_empty() {
        return ConsistencySignal::Missing { clients: missing };
    }

    // Reference is the newest copy, mirroring what reconciliation would pick.
    let mut reference = &copies[0];
    for copy in &copies[1..] {
        if copy.modified > reference.modified {
            reference = copy;
        }
    }
    let diverged: Vec<ClientName> = copies
        .iter()
        .filter(|c| c.digest != reference.digest)
        .map(|c| c.client.clone())
        .collect();
    if diverged.is_empty() {
        ConsistencySignal::Consistent
    } else {
        ConsistencySignal::Diverged { clients: diverged }
    }
}

fn hash_file(path: &Path) -> Result<String, SyncError> {
    let content = std::fs::read(path).map_err(|e| io_err(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(hex::encode(hasher.finalize()))
}

/// Format age from a chrono timestamp.
pub fn format_datetime_age(timestamp: DateTime<Utc>) -> String {
    let now = Utc::now();
    let age = now.signed_duration_since(timestamp).num_seconds().max(0) as u64;
    format_seconds(age)
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
