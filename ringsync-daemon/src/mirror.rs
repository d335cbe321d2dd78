//! Change dispatch and propagation over the File Graph.
//!
//! Each qualifying event names one node. Its watch is re-armed before any
//! copy happens. If the file still exists the node becomes the source of
//! truth and is replicated around its ring, one sibling at a time
//! (unwatch, copy, re-arm). If it is gone the removal was stray, and the
//! node is restored from the first surviving sibling in ring order.
//!
//! A watch replaced during propagation is retired until the source
//! acknowledges its removal. Records already queued for it, such as a
//! second copy changing before the drain, are skipped rather than treated
//! as unknown.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use ringsync_core::{ClientTable, WatchList};
use ringsync_sync::{probe, Replicator};

use crate::error::DaemonError;
use crate::graph::{FileGraph, GroupId, NodeId};
use crate::notifier::{ChangeKind, Notifier};

/// What one propagation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Propagation {
    /// The changed node was copied over every sibling, in ring order.
    Authoritative {
        source: NodeId,
        replicated: Vec<NodeId>,
    },
    /// The node's file was gone and has been restored from `from`.
    Repaired { node: NodeId, from: NodeId },
}

pub struct Mirror<N: Notifier, R: Replicator> {
    notifier: N,
    graph: FileGraph<N>,
    replicator: R,
    clients: ClientTable,
    follow_writes: bool,
    retired: Vec<(GroupId, N::Watch)>,
}

impl<N: Notifier, R: Replicator> Mirror<N, R> {
    /// Build the File Graph and take ownership of everything propagation
    /// needs.
    pub fn build(
        mut notifier: N,
        clients: ClientTable,
        tracked: &WatchList,
        replicator: R,
        follow_writes: bool,
    ) -> Result<Self, DaemonError> {
        let graph = FileGraph::build(&mut notifier, &clients, tracked)?;
        tracing::info!(
            groups = graph.groups().len(),
            nodes = graph.nodes().len(),
            "file graph built"
        );
        Ok(Self {
            notifier,
            graph,
            replicator,
            clients,
            follow_writes,
            retired: Vec::new(),
        })
    }

    pub fn graph(&self) -> &FileGraph<N> {
        &self.graph
    }

    #[cfg(test)]
    pub(crate) fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// Block until some groups have pending events; ascending group order.
    pub fn wait(&mut self, timeout: Option<Duration>) -> Result<Vec<GroupId>, DaemonError> {
        let sources = self.graph.sources();
        let ready = self
            .notifier
            .wait_any(&sources, timeout)
            .map_err(DaemonError::Wait)?;
        Ok(ready.into_iter().map(GroupId).collect())
    }

    /// One multiplexer iteration: wait, then dispatch every ready group.
    pub fn turn(&mut self, timeout: Option<Duration>) -> Result<Vec<Propagation>, DaemonError> {
        let mut outcomes = Vec::new();
        for group in self.wait(timeout)? {
            outcomes.extend(self.dispatch(group)?);
        }
        Ok(outcomes)
    }

    /// Serve change events until a propagation fails.
    pub fn run(&mut self) -> Result<(), DaemonError> {
        tracing::info!("watching for changes");
        loop {
            self.turn(None)?;
        }
    }

    /// Drain one group's events and propagate each qualifying one, in
    /// delivery order.
    pub fn dispatch(&mut self, group: GroupId) -> Result<Vec<Propagation>, DaemonError> {
        let tracked = self.graph.group(group).tracked.clone();
        let events = self
            .notifier
            .read_events(self.graph.group(group).source())
            .map_err(|source| DaemonError::Read {
                tracked: tracked.0.clone(),
                source,
            })?;
        if events.is_empty() {
            return Err(DaemonError::EmptyRead { tracked: tracked.0 });
        }

        let mut outcomes = Vec::new();
        for event in events {
            match event.kind {
                ChangeKind::Removed => {}
                ChangeKind::Written if self.follow_writes => {}
                ChangeKind::Written => continue,
                ChangeKind::Other => {
                    self.release(group, event.watch);
                    continue;
                }
                ChangeKind::Overflow => {
                    tracing::warn!(
                        tracked = %tracked,
                        "notification queue overflowed, changes may have been missed"
                    );
                    continue;
                }
            }
            if self.graph.locate(group, event.watch).is_none()
                && self.is_retired(group, event.watch)
            {
                tracing::debug!(
                    tracked = %tracked,
                    "skipping record for replaced watch {:?}",
                    event.watch
                );
                continue;
            }
            outcomes.push(self.propagate(group, event.watch)?);
        }
        Ok(outcomes)
    }

    /// Resolve one fired watch.
    pub fn propagate(&mut self, group: GroupId, watch: N::Watch) -> Result<Propagation, DaemonError> {
        let node = self
            .graph
            .locate(group, watch)
            .ok_or_else(|| DaemonError::UnknownWatch {
                group: group.0,
                watch: format!("{watch:?}"),
            })?;
        let path = self.graph.node(node).path().to_path_buf();

        let rearmed = match self.notifier.watch(self.graph.group(group).source(), &path) {
            Ok(fresh) => Some(fresh),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(source) => return Err(DaemonError::Rearm { path, source }),
        };

        let exists = match rearmed {
            None => false,
            Some(fresh) => {
                self.replace_watch(node, fresh);
                if probe(&path)?.is_some() {
                    true
                } else {
                    // Removed again between re-arm and probe.
                    if let Err(err) = self
                        .notifier
                        .unwatch(self.graph.group(group).source(), fresh)
                    {
                        tracing::debug!("dropping watch on {}: {err}", path.display());
                    }
                    false
                }
            }
        };

        if exists {
            self.fan_out(node)
        } else {
            self.repair(node)
        }
    }

    fn fan_out(&mut self, source: NodeId) -> Result<Propagation, DaemonError> {
        let group = self.graph.node(source).group;
        let source_path = self.graph.node(source).path().to_path_buf();
        let siblings: Vec<NodeId> = self.graph.ring(source).collect();
        tracing::info!(
            tracked = %self.graph.group(group).tracked,
            client = self.client_name(source),
            "{} changed, propagating to {} siblings",
            source_path.display(),
            siblings.len()
        );

        for &sibling in &siblings {
            let node = self.graph.node(sibling);
            let (path, watch) = (node.path().to_path_buf(), node.watch());
            match self.notifier.unwatch(self.graph.group(group).source(), watch) {
                Ok(()) => {}
                // The sibling changed too and its watch was consumed.
                Err(err) if err.kind() == ErrorKind::InvalidInput => {
                    tracing::debug!("watch on {} was already released", path.display());
                }
                Err(source) => return Err(DaemonError::Unwatch { path, source }),
            }
            self.replicator.replicate(&source_path, &path)?;
            let fresh = self.rearm(group, path)?;
            self.replace_watch(sibling, fresh);
        }

        Ok(Propagation::Authoritative {
            source,
            replicated: siblings,
        })
    }

    fn repair(&mut self, node: NodeId) -> Result<Propagation, DaemonError> {
        let group = self.graph.node(node).group;
        let tracked = self.graph.group(group).tracked.clone();
        let path = self.graph.node(node).path().to_path_buf();

        let mut survivor = None;
        for sibling in self.graph.ring(node) {
            if probe(self.graph.node(sibling).path())?.is_some() {
                survivor = Some(sibling);
                break;
            }
        }
        let from = survivor.ok_or_else(|| DaemonError::NoSurvivingSibling {
            tracked: tracked.0.clone(),
            path: path.clone(),
        })?;

        let from_path = self.graph.node(from).path().to_path_buf();
        tracing::warn!(
            tracked = %tracked,
            client = self.client_name(node),
            "{} was removed, restoring from {}",
            path.display(),
            from_path.display()
        );
        self.replicator.replicate(&from_path, &path)?;
        let fresh = self.rearm(group, path)?;
        self.replace_watch(node, fresh);

        Ok(Propagation::Repaired { node, from })
    }

    fn rearm(&mut self, group: GroupId, path: PathBuf) -> Result<N::Watch, DaemonError> {
        self.notifier
            .watch(self.graph.group(group).source(), &path)
            .map_err(|source| DaemonError::Rearm { path, source })
    }

    /// Point `node` at `fresh`, retiring the watch it held before.
    fn replace_watch(&mut self, node: NodeId, fresh: N::Watch) {
        let (group, old) = (self.graph.node(node).group, self.graph.node(node).watch());
        if old != fresh && !self.is_retired(group, old) {
            self.retired.push((group, old));
        }
        self.graph.set_watch(node, fresh);
    }

    fn is_retired(&self, group: GroupId, watch: N::Watch) -> bool {
        self.retired.contains(&(group, watch))
    }

    fn release(&mut self, group: GroupId, watch: N::Watch) {
        self.retired.retain(|entry| *entry != (group, watch));
    }

    fn client_name(&self, node: NodeId) -> &str {
        self.clients
            .get(self.graph.node(node).client)
            .map_or("?", |client| client.name.0.as_str())
    }
}
