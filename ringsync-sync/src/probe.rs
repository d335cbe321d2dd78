//! Existence probing.

use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;

use crate::error::{io_err, SyncError};

/// Stat `path`, following symlinks.
///
/// A missing file is an expected state, not an error: it maps to `Ok(None)`.
/// Every other failure (permission denied, I/O error, …) is reported.
pub fn probe(path: &Path) -> Result<Option<Metadata>, SyncError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Modification time of an already-probed file.
pub fn modified(path: &Path, meta: &Metadata) -> Result<SystemTime, SyncError> {
    meta.modified().map_err(|e| io_err(path, e))
}
