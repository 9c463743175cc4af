//! Autosave, undo, redo, and restore over the snapshot log.
//!
//! ## Model
//!
//! The snapshot log is a journal of every state the live graph passed
//! through. Two stacks of snapshot ids navigate it:
//!
//! - `undo_stack`: entries reached by undo, newest on top. While the live
//!   graph still equals the top entry, the next undo searches strictly older
//!   entries, so repeated undos walk backward instead of toggling.
//! - `redo_stack`: live states saved just before an undo or restore.
//!
//! Any content change not produced by the controller itself is a fresh edit:
//! it is committed to the log and both stacks are cleared.
//!
//! ## Ordering
//!
//! Every operation takes `&mut self`, so pushes, writes, and baseline
//! updates happen as one step that no tick can interleave with.

pub mod log;
pub mod tracker;

use tracing::{debug, info};

use crate::canonical::graph_hash;
use crate::config::KernelConfig;
use crate::host::{ChangeReason, GraphHost};
use crate::store::Storage;
use crate::types::StoryGraph;

pub use log::{Snapshot, SnapshotId, SnapshotKind, SnapshotLog, SnapshotMeta};
pub use tracker::ChangeTracker;

/// Result of one autosave tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The host exposed no graph; nothing was read.
    NoState,
    /// Content matches the baseline.
    Unchanged,
    /// A change was committed.
    Committed(SnapshotId),
}

/// Result of undo, redo, or restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// The live graph now holds this snapshot's content.
    Restored(SnapshotId),
    /// No earlier state differs from the live graph.
    NothingToUndo,
    /// The redo stack is empty.
    NothingToRedo,
    /// The requested snapshot is not in the log.
    NotFound(SnapshotId),
    /// The host refused the write; the live graph is unchanged.
    WriteRejected,
}

impl HistoryOutcome {
    /// Whether the live graph changed.
    pub fn is_restored(&self) -> bool {
        matches!(self, Self::Restored(_))
    }
}

/// Undo/redo controller and autosave committer.
#[derive(Debug)]
pub struct History<S: Storage> {
    log: SnapshotLog<S>,
    tracker: ChangeTracker,
    undo_stack: Vec<SnapshotId>,
    redo_stack: Vec<SnapshotId>,
}

impl<S: Storage> History<S> {
    /// Open the history over a storage backend.
    pub fn open(storage: S, config: &KernelConfig) -> Self {
        Self {
            log: SnapshotLog::open(storage, config),
            tracker: ChangeTracker::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// The snapshot log.
    pub fn log(&self) -> &SnapshotLog<S> {
        &self.log
    }

    /// The change tracker.
    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    /// Undo trail, oldest first.
    pub fn undo_stack(&self) -> &[SnapshotId] {
        &self.undo_stack
    }

    /// Redo stack, oldest first.
    pub fn redo_stack(&self) -> &[SnapshotId] {
        &self.redo_stack
    }

    /// One autosave tick: commit the host's graph if its content changed.
    pub fn tick<H: GraphHost + ?Sized>(&mut self, host: &H) -> TickOutcome {
        let Some(graph) = host.read_graph() else {
            debug!("no graph exposed, skipping tick");
            return TickOutcome::NoState;
        };
        match self.tracker.observe(graph) {
            Some(hash) => TickOutcome::Committed(self.commit(graph, hash)),
            None => TickOutcome::Unchanged,
        }
    }

    /// Commit pending edits immediately, as a tick would.
    ///
    /// Called before whole-graph replacements so no authored work is lost.
    pub fn capture<H: GraphHost + ?Sized>(&mut self, host: &H) -> Option<SnapshotId> {
        let graph = host.read_graph()?;
        let hash = self.tracker.observe(graph)?;
        Some(self.commit(graph, hash))
    }

    fn commit_if_changed(&mut self, graph: &StoryGraph, hash: u64) -> Option<SnapshotId> {
        self.tracker.differs(hash).then(|| self.commit(graph, hash))
    }

    /// Append the graph as an autosave and treat it as a fresh edit.
    fn commit(&mut self, graph: &StoryGraph, hash: u64) -> SnapshotId {
        let id = self.log.append(graph, SnapshotKind::Autosave);
        self.tracker.rebase(hash);
        if !self.undo_stack.is_empty() || !self.redo_stack.is_empty() {
            debug!("fresh edit, discarding undo trail and redo stack");
        }
        self.undo_stack.clear();
        self.redo_stack.clear();
        info!(snapshot = %id, scenes = graph.len(), "autosaved");
        id
    }

    /// Find the entry undo would restore, given the live content hash.
    fn undo_target(&self, live_hash: u64) -> Option<&Snapshot> {
        let entries = self.log.list();
        let ceiling = self
            .undo_stack
            .last()
            .and_then(|id| self.log.position(*id))
            .filter(|pos| entries[*pos].content_hash() == live_hash)
            .unwrap_or(entries.len());

        entries
            .iter()
            .take(ceiling)
            .rev()
            .find(|s| s.meta().kind.is_checkpoint() && s.content_hash() != live_hash)
    }

    /// Move the live graph to the most recent earlier state that differs from it.
    pub fn undo<H: GraphHost + ?Sized>(&mut self, host: &mut H) -> HistoryOutcome {
        let Some(live) = host.read_graph().cloned() else {
            return HistoryOutcome::NothingToUndo;
        };
        let live_hash = graph_hash(&live);
        self.commit_if_changed(&live, live_hash);

        let Some(target) = self.undo_target(live_hash) else {
            debug!("nothing to undo");
            return HistoryOutcome::NothingToUndo;
        };
        let target_id = target.id();
        let target_hash = target.content_hash();
        let graph = target.graph().clone();

        let saved = self.log.append(&live, SnapshotKind::Undo);
        if !host.write_graph(graph, ChangeReason::Restored) {
            return HistoryOutcome::WriteRejected;
        }
        self.redo_stack.push(saved);
        self.undo_stack.push(target_id);
        self.tracker.rebase(target_hash);
        self.prune_stacks();
        info!(snapshot = %target_id, "undo");
        HistoryOutcome::Restored(target_id)
    }

    /// Return to the state most recently moved away from by undo or restore.
    pub fn redo<H: GraphHost + ?Sized>(&mut self, host: &mut H) -> HistoryOutcome {
        let Some(live) = host.read_graph().cloned() else {
            return HistoryOutcome::NothingToRedo;
        };
        let live_hash = graph_hash(&live);
        self.commit_if_changed(&live, live_hash);

        let target = loop {
            match self.redo_stack.pop() {
                Some(id) => {
                    if let Some(snapshot) = self.log.get(id) {
                        break snapshot;
                    }
                }
                None => {
                    debug!("nothing to redo");
                    return HistoryOutcome::NothingToRedo;
                }
            }
        };
        let target_id = target.id();
        let target_hash = target.content_hash();
        let graph = target.graph().clone();

        self.log.append(&live, SnapshotKind::Redo);
        if !host.write_graph(graph, ChangeReason::Restored) {
            self.redo_stack.push(target_id);
            return HistoryOutcome::WriteRejected;
        }
        self.undo_stack.pop();
        self.tracker.rebase(target_hash);
        self.prune_stacks();
        info!(snapshot = %target_id, "redo");
        HistoryOutcome::Restored(target_id)
    }

    /// Restore a specific snapshot picked from the history list.
    ///
    /// The live state is saved first and pushed on the redo stack, so the
    /// restore can itself be undone or redone away from.
    pub fn restore<H: GraphHost + ?Sized>(&mut self, host: &mut H, id: SnapshotId) -> HistoryOutcome {
        let Some(live) = host.read_graph().cloned() else {
            return HistoryOutcome::NotFound(id);
        };
        let live_hash = graph_hash(&live);
        self.commit_if_changed(&live, live_hash);

        let Some(target) = self.log.get(id) else {
            debug!(snapshot = %id, "restore target not in log");
            return HistoryOutcome::NotFound(id);
        };
        let target_hash = target.content_hash();
        let graph = target.graph().clone();

        let saved = self.log.append(&live, SnapshotKind::Restore);
        if !host.write_graph(graph, ChangeReason::Restored) {
            return HistoryOutcome::WriteRejected;
        }
        self.redo_stack.push(saved);
        self.undo_stack.clear();
        self.tracker.rebase(target_hash);
        self.prune_stacks();
        info!(snapshot = %id, "restored");
        HistoryOutcome::Restored(id)
    }

    /// Whether undo would change the given live graph.
    pub fn can_undo(&self, live: &StoryGraph) -> bool {
        self.undo_target(graph_hash(live)).is_some()
    }

    /// Whether the redo stack holds a snapshot still in the log.
    pub fn can_redo(&self) -> bool {
        self.redo_stack.iter().any(|id| self.log.contains(*id))
    }

    /// Delete one snapshot from the log.
    pub fn delete_snapshot(&mut self, id: SnapshotId) -> bool {
        let removed = self.log.delete(id).is_some();
        self.prune_stacks();
        removed
    }

    /// Delete every snapshot and forget both stacks.
    ///
    /// The tracker baseline is kept: an unchanged live graph is not
    /// re-committed right after the user cleared history.
    pub fn clear(&mut self) {
        self.log.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
        info!("history cleared");
    }

    /// Drop stack entries whose snapshots were evicted or deleted.
    fn prune_stacks(&mut self) {
        let log = &self.log;
        self.undo_stack.retain(|id| log.contains(*id));
        self.redo_stack.retain(|id| log.contains(*id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStorage;
    use crate::types::{Position, ScenePatch};
    use std::sync::Arc;

    /// Minimal host holding a graph directly.
    #[derive(Default)]
    struct TestHost {
        graph: Option<StoryGraph>,
        writes: usize,
        reject: bool,
    }

    impl GraphHost for TestHost {
        fn read_graph(&self) -> Option<&StoryGraph> {
            self.graph.as_ref()
        }

        fn write_graph(&mut self, graph: StoryGraph, _reason: ChangeReason) -> bool {
            if self.reject {
                return false;
            }
            self.graph = Some(graph);
            self.writes += 1;
            true
        }
    }

    impl TestHost {
        fn with_graph() -> Self {
            Self {
                graph: Some(StoryGraph::new()),
                ..Self::default()
            }
        }

        fn graph_mut(&mut self) -> &mut StoryGraph {
            self.graph.get_or_insert_with(StoryGraph::new)
        }

        fn current(&self) -> StoryGraph {
            self.graph.clone().unwrap_or_default()
        }
    }

    fn history() -> History<Arc<InMemoryStorage>> {
        History::open(Arc::new(InMemoryStorage::new()), &KernelConfig::default())
    }

    #[test]
    fn test_tick_skips_without_state() {
        let mut history = history();
        let host = TestHost::default();
        assert_eq!(history.tick(&host), TickOutcome::NoState);
        assert!(history.log().is_empty());
    }

    #[test]
    fn test_tick_commits_only_on_change() {
        let mut history = history();
        let mut host = TestHost::with_graph();

        assert!(matches!(history.tick(&host), TickOutcome::Committed(_)));
        assert_eq!(history.tick(&host), TickOutcome::Unchanged);

        host.graph_mut().create_scene(Position::default());
        assert!(matches!(history.tick(&host), TickOutcome::Committed(_)));
        assert_eq!(history.log().len(), 2);
    }

    #[test]
    fn test_undo_redo_roundtrip() {
        let mut history = history();
        let mut host = TestHost::with_graph();
        let id = host.graph_mut().create_scene(Position::default());
        history.tick(&host);
        let before = host.current();

        host.graph_mut().update_scene(&id, ScenePatch::title("Lighthouse"));
        let edited = host.current();

        assert!(history.undo(&mut host).is_restored());
        assert_eq!(host.current(), before);

        assert!(history.redo(&mut host).is_restored());
        assert_eq!(host.current(), edited);
    }

    #[test]
    fn test_restore_updates_baseline() {
        let mut history = history();
        let mut host = TestHost::with_graph();
        history.tick(&host);
        host.graph_mut().create_scene(Position::default());
        history.tick(&host);
        let len = history.log().len();

        assert!(history.undo(&mut host).is_restored());
        // Undo saved nothing new (live state was already the newest entry),
        // and the next tick sees no change.
        assert_eq!(history.log().len(), len);
        assert_eq!(history.tick(&host), TickOutcome::Unchanged);
    }

    #[test]
    fn test_repeated_undo_walks_backward() {
        let mut history = history();
        let mut host = TestHost::with_graph();
        let mut states = vec![host.current()];
        history.tick(&host);
        for _ in 0..3 {
            host.graph_mut().create_scene(Position::default());
            states.push(host.current());
            history.tick(&host);
        }

        for expected in states[..3].iter().rev() {
            assert!(history.undo(&mut host).is_restored());
            assert_eq!(&host.current(), expected);
        }
        assert_eq!(history.undo(&mut host), HistoryOutcome::NothingToUndo);

        for expected in &states[1..] {
            assert!(history.redo(&mut host).is_restored());
            assert_eq!(&host.current(), expected);
        }
        assert_eq!(history.redo(&mut host), HistoryOutcome::NothingToRedo);
    }

    #[test]
    fn test_edit_after_undo_clears_redo() {
        let mut history = history();
        let mut host = TestHost::with_graph();
        history.tick(&host);
        host.graph_mut().create_scene(Position::default());
        history.tick(&host);

        history.undo(&mut host);
        assert!(history.can_redo());

        // No tick between the edit and redo: redo itself notices the edit.
        host.graph_mut().create_scene(Position::new(50.0, 50.0));
        assert_eq!(history.redo(&mut host), HistoryOutcome::NothingToRedo);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_nothing_to_undo_on_single_state() {
        let mut history = history();
        let mut host = TestHost::with_graph();
        history.tick(&host);
        assert_eq!(history.undo(&mut host), HistoryOutcome::NothingToUndo);
        assert_eq!(host.writes, 0);
    }

    #[test]
    fn test_restore_explicit_is_undoable() {
        let mut history = history();
        let mut host = TestHost::with_graph();
        let first = match history.tick(&host) {
            TickOutcome::Committed(id) => id,
            other => panic!("expected commit, got {other:?}"),
        };
        host.graph_mut().create_scene(Position::default());
        host.graph_mut().create_scene(Position::default());
        let latest = host.current();

        assert_eq!(history.restore(&mut host, first), HistoryOutcome::Restored(first));
        assert!(host.current().is_empty());

        assert!(history.undo(&mut host).is_restored());
        assert_eq!(host.current(), latest);
    }

    #[test]
    fn test_restore_unknown_id() {
        let mut history = history();
        let mut host = TestHost::with_graph();
        history.tick(&host);
        let ghost = {
            let id = history.log().latest().unwrap().id();
            history.delete_snapshot(id);
            id
        };
        assert_eq!(history.restore(&mut host, ghost), HistoryOutcome::NotFound(ghost));
    }

    #[test]
    fn test_rejected_write_leaves_stacks() {
        let mut history = history();
        let mut host = TestHost::with_graph();
        history.tick(&host);
        host.graph_mut().create_scene(Position::default());
        history.tick(&host);
        let live = host.current();

        host.reject = true;
        assert_eq!(history.undo(&mut host), HistoryOutcome::WriteRejected);
        assert_eq!(host.current(), live);
        assert!(history.redo_stack().is_empty());
    }

    #[test]
    fn test_clear_history() {
        let mut history = history();
        let mut host = TestHost::with_graph();
        history.tick(&host);
        host.graph_mut().create_scene(Position::default());
        history.undo(&mut host);

        history.clear();
        assert!(history.log().is_empty());
        assert!(!history.can_redo());
        assert_eq!(history.tick(&host), TickOutcome::Unchanged);
    }
}
