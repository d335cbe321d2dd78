//! In-memory notifier for graph and propagation tests.
//!
//! Every source numbers its watches from 1, so two groups routinely hold
//! watches with equal raw values. Nothing happens on its own: tests fire
//! removals or push raw events, and `wait_any` reports the sources whose
//! queues are non-empty.

use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::notifier::{ChangeEvent, ChangeKind, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FakeWatch(pub u32);

#[derive(Debug)]
pub struct FakeSource(usize);

#[derive(Debug, Default)]
struct SourceState {
    next_watch: u32,
    live: BTreeMap<FakeWatch, PathBuf>,
    queue: VecDeque<ChangeEvent<FakeWatch>>,
}

#[derive(Debug, Default)]
pub struct FakeNotifier {
    sources: Vec<SourceState>,
}

impl FakeNotifier {
    /// Simulate the kernel reporting `path` removed: the watch is consumed
    /// and a removal followed by an acknowledgement is queued.
    pub fn fire(&mut self, source: usize, path: &Path) -> FakeWatch {
        let state = &mut self.sources[source];
        let watch = state
            .live
            .iter()
            .find(|(_, watched)| watched.as_path() == path)
            .map(|(watch, _)| *watch)
            .unwrap_or_else(|| panic!("no live watch on {}", path.display()));
        state.live.remove(&watch);
        state.queue.push_back(ChangeEvent {
            watch,
            kind: ChangeKind::Removed,
        });
        state.queue.push_back(ChangeEvent {
            watch,
            kind: ChangeKind::Other,
        });
        watch
    }

    pub fn push(&mut self, source: usize, event: ChangeEvent<FakeWatch>) {
        self.sources[source].queue.push_back(event);
    }

    pub fn is_live(&self, source: usize, watch: FakeWatch) -> bool {
        self.sources[source].live.contains_key(&watch)
    }

    pub fn live_count(&self, source: usize) -> usize {
        self.sources[source].live.len()
    }
}

impl Notifier for FakeNotifier {
    type Source = FakeSource;
    type Watch = FakeWatch;

    fn create_source(&mut self) -> io::Result<FakeSource> {
        self.sources.push(SourceState {
            next_watch: 1,
            ..SourceState::default()
        });
        Ok(FakeSource(self.sources.len() - 1))
    }

    fn watch(&mut self, source: &FakeSource, path: &Path) -> io::Result<FakeWatch> {
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            ));
        }
        let state = &mut self.sources[source.0];
        if let Some((watch, _)) = state.live.iter().find(|(_, watched)| *watched == path) {
            return Ok(*watch);
        }
        let watch = FakeWatch(state.next_watch);
        state.next_watch += 1;
        state.live.insert(watch, path.to_path_buf());
        Ok(watch)
    }

    fn unwatch(&mut self, source: &FakeSource, watch: FakeWatch) -> io::Result<()> {
        let state = &mut self.sources[source.0];
        if state.live.remove(&watch).is_none() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{watch:?} is not live"),
            ));
        }
        state.queue.push_back(ChangeEvent {
            watch,
            kind: ChangeKind::Other,
        });
        Ok(())
    }

    fn wait_any(
        &mut self,
        sources: &[&FakeSource],
        _timeout: Option<Duration>,
    ) -> io::Result<Vec<usize>> {
        Ok(sources
            .iter()
            .enumerate()
            .filter(|(_, source)| !self.sources[source.0].queue.is_empty())
            .map(|(idx, _)| idx)
            .collect())
    }

    fn read_events(&mut self, source: &FakeSource) -> io::Result<Vec<ChangeEvent<FakeWatch>>> {
        Ok(self.sources[source.0].queue.drain(..).collect())
    }
}
