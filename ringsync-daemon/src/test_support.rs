use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use ringsync_core::{Client, ClientTable, TrackedPath, WatchList};
use ringsync_sync::{CopyReplicator, Replicator, SyncError};
use tempfile::TempDir;

/// Client roots under one scratch directory, every tracked path seeded
/// with identical content.
pub struct Fixture {
    pub dir: TempDir,
    pub clients: ClientTable,
    pub tracked: WatchList,
}

pub const SEED: &str = "seed\n";

pub fn fixture(clients: &[&str], tracked: &[&str]) -> Fixture {
    let dir = TempDir::new().expect("scratch dir");
    let table = clients
        .iter()
        .map(|name| {
            let root = dir.path().join(name);
            Client::new(*name, root.to_string_lossy()).expect("client")
        })
        .collect();
    let fixture = Fixture {
        clients: ClientTable::new(table).expect("client table"),
        tracked: WatchList::new(tracked.iter().map(|t| TrackedPath::from(*t)).collect())
            .expect("watch list"),
        dir,
    };
    for client in clients {
        for path in tracked {
            let file = fixture.path(client, path);
            fs::create_dir_all(file.parent().expect("parent")).expect("mkdir");
            fs::write(&file, SEED).expect("seed");
        }
    }
    fixture
}

impl Fixture {
    pub fn path(&self, client: &str, tracked: &str) -> PathBuf {
        PathBuf::from(format!("{}/{client}{tracked}", self.dir.path().display()))
    }

    pub fn read(&self, client: &str, tracked: &str) -> String {
        fs::read_to_string(self.path(client, tracked)).expect("read copy")
    }
}

/// Copies in-process and records every call.
#[derive(Default)]
pub struct RecordingReplicator {
    pub calls: RefCell<Vec<(PathBuf, PathBuf)>>,
    pub fail: bool,
}

impl Replicator for RecordingReplicator {
    fn replicate(&self, source: &Path, dest: &Path) -> Result<(), SyncError> {
        self.calls
            .borrow_mut()
            .push((source.to_path_buf(), dest.to_path_buf()));
        if self.fail {
            return Err(SyncError::CommandFailed {
                program: PathBuf::from("recording"),
                source_path: source.to_path_buf(),
                dest: dest.to_path_buf(),
                status: "exit status: 1".to_string(),
            });
        }
        CopyReplicator.replicate(source, dest)
    }
}
