//! The File Graph: one monitoring group per tracked path, each holding a
//! ring of per-client file nodes.
//!
//! Nodes live in a single arena. A group's nodes occupy a contiguous slice
//! in client-table order, so the ring successor of a node is the next slot
//! of that slice, wrapping to its start. The arena order (groups in
//! watch-list order, clients in table order within each) is the flat index.

use std::path::{Path, PathBuf};

use ringsync_core::{ClientTable, TrackedPath, WatchList};

use crate::error::DaemonError;
use crate::notifier::Notifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

/// Watches for one tracked path across all clients. Owns the notification
/// source; dropping the group releases every watch registered on it.
#[derive(Debug)]
pub struct MonitoringGroup<S> {
    pub tracked: TrackedPath,
    source: S,
    first: usize,
    len: usize,
}

impl<S> MonitoringGroup<S> {
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        (self.first..self.first + self.len).map(NodeId)
    }
}

/// One client's copy of one tracked path.
#[derive(Debug, Clone)]
pub struct FileNode<W> {
    path: PathBuf,
    watch: W,
    pub group: GroupId,
    /// Position in the client table.
    pub client: usize,
}

impl<W: Copy> FileNode<W> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn watch(&self) -> W {
        self.watch
    }
}

pub struct FileGraph<N: Notifier> {
    groups: Vec<MonitoringGroup<N::Source>>,
    nodes: Vec<FileNode<N::Watch>>,
}

impl<N: Notifier> FileGraph<N> {
    /// Create one source per tracked path and watch every client's copy.
    ///
    /// Any registration failure fails the whole build; groups created so far
    /// are dropped with the partial graph, which releases their watches.
    pub fn build(
        notifier: &mut N,
        clients: &ClientTable,
        tracked: &WatchList,
    ) -> Result<Self, DaemonError> {
        let mut groups = Vec::with_capacity(tracked.len());
        let mut nodes = Vec::with_capacity(tracked.len() * clients.len());

        for tracked_path in tracked {
            let source = notifier
                .create_source()
                .map_err(|source| DaemonError::CreateSource {
                    tracked: tracked_path.0.clone(),
                    source,
                })?;
            let group = GroupId(groups.len());
            let first = nodes.len();

            for (client_idx, client) in clients.iter().enumerate() {
                let path = client.resolve(tracked_path);
                let watch =
                    notifier
                        .watch(&source, &path)
                        .map_err(|source| DaemonError::GraphBuild {
                            client: client.name.0.clone(),
                            path: path.clone(),
                            source,
                        })?;
                tracing::debug!(
                    tracked = %tracked_path,
                    client = %client.name,
                    watch = ?watch,
                    "watching {}",
                    path.display()
                );
                nodes.push(FileNode {
                    path,
                    watch,
                    group,
                    client: client_idx,
                });
            }

            groups.push(MonitoringGroup {
                tracked: tracked_path.clone(),
                source,
                first,
                len: clients.len(),
            });
        }

        Ok(Self { groups, nodes })
    }

    pub fn groups(&self) -> &[MonitoringGroup<N::Source>] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> &MonitoringGroup<N::Source> {
        &self.groups[id.0]
    }

    /// Every node, in flat-index order.
    pub fn nodes(&self) -> &[FileNode<N::Watch>] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &FileNode<N::Watch> {
        &self.nodes[id.0]
    }

    /// Ring successor within the node's group.
    pub fn sibling(&self, id: NodeId) -> NodeId {
        let group = &self.groups[self.nodes[id.0].group.0];
        let offset = id.0 - group.first;
        NodeId(group.first + (offset + 1) % group.len)
    }

    /// Walk the ring from `start`, yielding every other node exactly once.
    pub fn ring(&self, start: NodeId) -> Ring<'_, N> {
        Ring {
            graph: self,
            start,
            current: start,
        }
    }

    /// Find the node holding `watch` inside `group`. Watch values are only
    /// unique per source, so both must match.
    pub fn locate(&self, group: GroupId, watch: N::Watch) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.group == group && node.watch == watch)
            .map(NodeId)
    }

    pub(crate) fn set_watch(&mut self, id: NodeId, watch: N::Watch) {
        self.nodes[id.0].watch = watch;
    }

    /// Sources in group order, as handed to the multiplexer.
    pub fn sources(&self) -> Vec<&N::Source> {
        self.groups.iter().map(|group| &group.source).collect()
    }
}

pub struct Ring<'a, N: Notifier> {
    graph: &'a FileGraph<N>,
    start: NodeId,
    current: NodeId,
}

impl<N: Notifier> Iterator for Ring<'_, N> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.graph.sibling(self.current);
        if next == self.start {
            return None;
        }
        self.current = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeNotifier, FakeWatch};
    use crate::test_support::{fixture, Fixture};

    fn build(fixture: &Fixture) -> (FakeNotifier, FileGraph<FakeNotifier>) {
        let mut notifier = FakeNotifier::default();
        let graph = FileGraph::build(&mut notifier, &fixture.clients, &fixture.tracked)
            .expect("graph builds");
        (notifier, graph)
    }

    #[test]
    fn every_ring_returns_to_origin_after_one_lap() {
        let fixture = fixture(&["a", "b", "c"], &["/etc/hosts", "/etc/resolv.conf"]);
        let (_notifier, graph) = build(&fixture);

        for origin in (0..graph.nodes().len()).map(NodeId) {
            let mut current = origin;
            let mut seen = Vec::new();
            for _ in 0..fixture.clients.len() {
                current = graph.sibling(current);
                assert_eq!(graph.node(current).group, graph.node(origin).group);
                seen.push(current);
            }
            assert_eq!(current, origin, "lap from {origin:?} did not close");
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), fixture.clients.len());

            let others: Vec<NodeId> = graph.ring(origin).collect();
            assert_eq!(others.len(), fixture.clients.len() - 1);
            assert!(!others.contains(&origin));
        }
    }

    #[test]
    fn flat_index_is_creation_order() {
        let fixture = fixture(&["a", "b"], &["/x", "/y"]);
        let (_notifier, graph) = build(&fixture);

        let order: Vec<(usize, usize)> = graph
            .nodes()
            .iter()
            .map(|node| (node.group.0, node.client))
            .collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        assert_eq!(graph.node(NodeId(3)).path(), fixture.path("b", "/y"));
        assert_eq!(graph.groups()[1].tracked.as_str(), "/y");
    }

    #[test]
    fn single_client_ring_is_a_self_loop() {
        let fixture = fixture(&["solo"], &["/x"]);
        let (_notifier, graph) = build(&fixture);
        assert_eq!(graph.sibling(NodeId(0)), NodeId(0));
        assert_eq!(graph.ring(NodeId(0)).count(), 0);
    }

    #[test]
    fn locate_matches_group_and_watch_together() {
        let fixture = fixture(&["a", "b"], &["/x", "/y"]);
        let (_notifier, graph) = build(&fixture);

        // Per-source counters hand out the same raw values in both groups.
        assert_eq!(graph.node(NodeId(0)).watch(), graph.node(NodeId(2)).watch());
        assert_eq!(
            graph.locate(GroupId(1), graph.node(NodeId(2)).watch()),
            Some(NodeId(2))
        );
        assert_eq!(
            graph.locate(GroupId(0), graph.node(NodeId(0)).watch()),
            Some(NodeId(0))
        );
        assert_eq!(graph.locate(GroupId(0), FakeWatch(99)), None);
    }

    #[test]
    fn build_fails_when_a_copy_is_missing() {
        let fixture = fixture(&["a", "b"], &["/x"]);
        std::fs::remove_file(fixture.path("b", "/x")).unwrap();

        let mut notifier = FakeNotifier::default();
        let err = FileGraph::build(&mut notifier, &fixture.clients, &fixture.tracked)
            .err()
            .expect("build must fail");
        match err {
            DaemonError::GraphBuild { client, path, .. } => {
                assert_eq!(client, "b");
                assert_eq!(path, fixture.path("b", "/x"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
