//! Replicators: copy one client's file over another's.
//!
//! ## `CopyReplicator`: 5-step protocol
//!
//! 1. Stat the source (and the destination, if present).
//! 2. Copy the source to `<dest>.ringsync.tmp`.
//! 3. Keep the destination's permission mode when it already existed.
//! 4. Stamp the temporary with the source's access/modification times.
//! 5. Rename over the destination (atomic on POSIX).
//!
//! Step 4 is what keeps reconciliation idempotent: every replica carries the
//! canonical copy's mtime, so a second pass sees nothing strictly older.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use filetime::FileTime;
use ringsync_core::ReplicatorKind;

use crate::error::{io_err, SyncError};

/// Copies `source` over `dest`. Implementations must overwrite any existing
/// destination content and be safe to call repeatedly.
pub trait Replicator {
    fn replicate(&self, source: &Path, dest: &Path) -> Result<(), SyncError>;
}

impl<R: Replicator + ?Sized> Replicator for Box<R> {
    fn replicate(&self, source: &Path, dest: &Path) -> Result<(), SyncError> {
        (**self).replicate(source, dest)
    }
}

impl<R: Replicator + ?Sized> Replicator for &R {
    fn replicate(&self, source: &Path, dest: &Path) -> Result<(), SyncError> {
        (**self).replicate(source, dest)
    }
}

/// Build the replicator named in configuration.
pub fn from_kind(kind: &ReplicatorKind) -> Box<dyn Replicator> {
    match kind {
        ReplicatorKind::Copy => Box::new(CopyReplicator),
        ReplicatorKind::Command { program, args } => {
            Box::new(CommandReplicator::new(program.clone(), args.clone()))
        }
    }
}

// ---------------------------------------------------------------------------
// CopyReplicator
// ---------------------------------------------------------------------------

/// In-process replicator (see module docs).
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyReplicator;

impl Replicator for CopyReplicator {
    fn replicate(&self, source: &Path, dest: &Path) -> Result<(), SyncError> {
        let tmp = PathBuf::from(format!("{}.ringsync.tmp", dest.display()));
        copy_with_tmp(source, dest, &tmp)
    }
}

fn copy_with_tmp(source: &Path, dest: &Path, tmp: &Path) -> Result<(), SyncError> {
    // Step 1: stat both ends.
    let source_meta = std::fs::metadata(source).map_err(|e| io_err(source, e))?;
    let dest_permissions = match std::fs::metadata(dest) {
        Ok(meta) => Some(meta.permissions()),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => return Err(io_err(dest, err)),
    };

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    // Steps 2-4 operate on the temporary only; any failure removes it.
    let staged = (|| {
        std::fs::copy(source, tmp).map_err(|e| io_err(tmp, e))?;
        if let Some(permissions) = dest_permissions {
            std::fs::set_permissions(tmp, permissions).map_err(|e| io_err(tmp, e))?;
        }
        filetime::set_file_times(
            tmp,
            FileTime::from_last_access_time(&source_meta),
            FileTime::from_last_modification_time(&source_meta),
        )
        .map_err(|e| io_err(tmp, e))
    })();
    if let Err(err) = staged {
        let _ = std::fs::remove_file(tmp);
        return Err(err);
    }

    // Step 5: atomic rename to final path.
    if let Err(e) = std::fs::rename(tmp, dest) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(dest, e));
    }

    tracing::info!("replicated {} -> {}", source.display(), dest.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// CommandReplicator
// ---------------------------------------------------------------------------

/// Runs an external copy program (`cp -p` by default) and waits for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReplicator {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandReplicator {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Replicator for CommandReplicator {
    fn replicate(&self, source: &Path, dest: &Path) -> Result<(), SyncError> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(source)
            .arg(dest)
            .status()
            .map_err(|source| SyncError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(SyncError::CommandFailed {
                program: self.program.clone(),
                source_path: source.to_path_buf(),
                dest: dest.to_path_buf(),
                status: status.to_string(),
            });
        }

        tracing::info!(
            "replicated {} -> {} via {}",
            source.display(),
            dest.display(),
            self.program.display()
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
