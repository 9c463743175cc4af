//! Content-hash change detection.

use crate::canonical::graph_hash;
use crate::types::StoryGraph;

/// Remembers the content hash of the last committed graph state.
///
/// The tracker only answers "did the content change since the baseline";
/// committing is the caller's job. Restores must call [`ChangeTracker::rebase`]
/// synchronously so the next tick does not re-commit restored content.
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    baseline: Option<u64>,
}

impl ChangeTracker {
    /// Create a tracker with no baseline; the first observation always reports a change.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash of the last committed state.
    pub fn baseline(&self) -> Option<u64> {
        self.baseline
    }

    /// Return the graph's hash if it differs from the baseline.
    ///
    /// Does not move the baseline.
    pub fn observe(&self, graph: &StoryGraph) -> Option<u64> {
        let hash = graph_hash(graph);
        self.differs(hash).then_some(hash)
    }

    /// Whether a precomputed hash differs from the baseline.
    pub fn differs(&self, hash: u64) -> bool {
        self.baseline != Some(hash)
    }

    /// Move the baseline.
    pub fn rebase(&mut self, hash: u64) {
        self.baseline = Some(hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    #[test]
    fn test_first_observation_is_change() {
        let tracker = ChangeTracker::new();
        assert!(tracker.observe(&StoryGraph::new()).is_some());
    }

    #[test]
    fn test_rebase_suppresses_until_edit() {
        let mut tracker = ChangeTracker::new();
        let mut graph = StoryGraph::new();
        let hash = tracker.observe(&graph).unwrap();
        tracker.rebase(hash);
        assert!(tracker.observe(&graph).is_none());

        graph.create_scene(Position::default());
        assert!(tracker.observe(&graph).is_some());
        assert_eq!(tracker.baseline(), Some(hash));
    }
}
