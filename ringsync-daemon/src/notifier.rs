//! Change-notification abstraction.
//!
//! A [`Notifier`] hands out notification *sources* (one per monitoring group)
//! and registers one-shot per-file *watches* inside them. A watch fires once
//! when its file is removed or replaced and must be registered again
//! afterwards. Dropping a source releases every watch registered on it.

use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;

/// What happened to a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The file was deleted or replaced by another inode. Consumes the watch.
    Removed,
    /// The file was written in place and closed.
    Written,
    /// The source's kernel queue overflowed and events were dropped.
    Overflow,
    /// Anything else (watch removal acknowledgements and the like).
    Other,
}

/// One decoded record read from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent<W> {
    pub watch: W,
    pub kind: ChangeKind,
}

pub trait Notifier {
    /// An owned notification handle shared by every watch of one group.
    type Source;
    /// A watch handle. Only unique within the source that issued it.
    type Watch: Copy + Eq + fmt::Debug;

    fn create_source(&mut self) -> io::Result<Self::Source>;

    /// Register a watch on `path`. Fails with `NotFound` if the path is gone.
    fn watch(&mut self, source: &Self::Source, path: &Path) -> io::Result<Self::Watch>;

    fn unwatch(&mut self, source: &Self::Source, watch: Self::Watch) -> io::Result<()>;

    /// Block until at least one source has pending events and return the
    /// ready positions within `sources`, ascending. `None` waits forever;
    /// an expired timeout returns an empty list.
    fn wait_any(
        &mut self,
        sources: &[&Self::Source],
        timeout: Option<Duration>,
    ) -> io::Result<Vec<usize>>;

    /// Drain pending events of one source in delivery order.
    fn read_events(&mut self, source: &Self::Source) -> io::Result<Vec<ChangeEvent<Self::Watch>>>;
}
