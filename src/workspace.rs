//! The authoring workspace: live graph, history, and the whole-story
//! operations that span both.
//!
//! ## Ordering
//!
//! Every whole-graph replacement (import, sample, clear) first captures
//! the live graph into history, so the replaced story is always one undo
//! away.

use tracing::{info, warn};

use crate::config::KernelConfig;
use crate::editor::StoryEditor;
use crate::exchange::{export_document, parse_document, sample_story, FormatError, SharedScene};
use crate::history::{History, HistoryOutcome, SnapshotId, TickOutcome};
use crate::host::ChangeReason;
use crate::paths::{PathAnalyzer, StoryAnalytics, StoryPath};
use crate::store::Storage;
use crate::types::{SceneId, StoryGraph};

/// Live story plus its snapshot history, sharing one storage backend.
#[derive(Debug)]
pub struct Workspace<S: Storage + Clone> {
    editor: StoryEditor<S>,
    history: History<S>,
    config: KernelConfig,
}

impl<S: Storage + Clone> Workspace<S> {
    /// Open the workspace, loading the live graph and the snapshot log.
    pub fn open(storage: S, config: KernelConfig) -> Self {
        let editor = StoryEditor::open(storage.clone(), &config);
        let history = History::open(storage, &config);
        info!(
            scenes = editor.graph().len(),
            snapshots = history.log().len(),
            "workspace opened"
        );
        Self {
            editor,
            history,
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// The live graph.
    pub fn graph(&self) -> &StoryGraph {
        self.editor.graph()
    }

    /// The editor (for subscriptions).
    pub fn editor(&self) -> &StoryEditor<S> {
        &self.editor
    }

    /// Mutable editor access.
    pub fn editor_mut(&mut self) -> &mut StoryEditor<S> {
        &mut self.editor
    }

    /// Snapshot history.
    pub fn history(&self) -> &History<S> {
        &self.history
    }

    /// Apply an edit to the live graph.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut StoryGraph) -> R) -> R {
        self.editor.edit(f)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────────

    /// One autosave tick.
    pub fn tick(&mut self) -> TickOutcome {
        self.history.tick(&self.editor)
    }

    /// Undo to the previous distinct state.
    pub fn undo(&mut self) -> HistoryOutcome {
        self.history.undo(&mut self.editor)
    }

    /// Redo the last undo.
    pub fn redo(&mut self) -> HistoryOutcome {
        self.history.redo(&mut self.editor)
    }

    /// Restore a specific snapshot.
    pub fn restore(&mut self, id: SnapshotId) -> HistoryOutcome {
        self.history.restore(&mut self.editor, id)
    }

    /// Whether an undo would change the live graph.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo(self.editor.graph())
    }

    /// Whether a redo is available.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Delete one snapshot from the log.
    pub fn delete_snapshot(&mut self, id: SnapshotId) -> bool {
        self.history.delete_snapshot(id)
    }

    /// Drop all snapshots. The live graph is untouched.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Whole-story operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the story with an imported document.
    ///
    /// Malformed input is rejected before anything changes.
    pub fn import_json(&mut self, json: &str) -> Result<(), FormatError> {
        let graph = match parse_document(json) {
            Ok(graph) => graph,
            Err(e) => {
                warn!(error = %e, "rejected story import");
                return Err(e);
            }
        };
        self.history.capture(&self.editor);
        self.editor.replace(graph, ChangeReason::Imported);
        info!(scenes = self.editor.graph().len(), "story imported");
        Ok(())
    }

    /// Export the live story.
    pub fn export_json(&self) -> Result<String, FormatError> {
        export_document(self.editor.graph())
    }

    /// Replace the story with the bundled sample.
    pub fn load_sample(&mut self) {
        self.history.capture(&self.editor);
        self.editor.replace(sample_story(), ChangeReason::SampleLoaded);
    }

    /// Replace the story with an empty one.
    pub fn clear_story(&mut self) {
        self.history.capture(&self.editor);
        self.editor.replace(StoryGraph::new(), ChangeReason::Cleared);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Analysis
    // ─────────────────────────────────────────────────────────────────────────

    /// Analytics for the live story.
    pub fn analytics(&self) -> StoryAnalytics {
        PathAnalyzer::new(self.editor.graph()).analyze()
    }

    /// Every distinct path through the live story.
    pub fn paths(&self) -> Vec<StoryPath> {
        PathAnalyzer::new(self.editor.graph()).enumerate().0
    }

    /// Share link query fragment for one scene.
    pub fn share_scene(&self, id: &SceneId) -> Option<Result<String, FormatError>> {
        SharedScene::from_graph(self.editor.graph(), id).map(|shared| shared.to_query())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStorage;
    use crate::types::Position;
    use std::sync::Arc;

    fn workspace() -> Workspace<Arc<InMemoryStorage>> {
        Workspace::open(Arc::new(InMemoryStorage::new()), KernelConfig::default())
    }

    #[test]
    fn test_rejected_import_leaves_story() {
        let mut ws = workspace();
        ws.edit(|g| g.create_scene(Position::default()));
        let before = ws.graph().clone();
        let snapshots = ws.history().log().len();

        assert!(ws.import_json(r#"{"scenes": "not-an-object"}"#).is_err());
        assert_eq!(ws.graph(), &before);
        assert_eq!(ws.history().log().len(), snapshots);
    }

    #[test]
    fn test_import_is_undoable() {
        let mut ws = workspace();
        let id = ws.edit(|g| g.create_scene(Position::default()));
        ws.import_json(r#"{"scenes": {"a": {"id": "a"}}, "startSceneId": "a"}"#)
            .unwrap();
        assert!(ws.graph().contains(&SceneId::new("a")));

        assert!(ws.undo().is_restored());
        assert!(ws.graph().contains(&id));
        assert!(!ws.graph().contains(&SceneId::new("a")));
    }

    #[test]
    fn test_sample_then_clear() {
        let mut ws = workspace();
        ws.load_sample();
        assert_eq!(ws.graph().len(), 6);
        assert_eq!(ws.analytics().path_count, 2);

        ws.clear_story();
        assert!(ws.graph().is_empty());
        assert!(ws.undo().is_restored());
        assert_eq!(ws.graph().len(), 6);
    }

    #[test]
    fn test_share_scene() {
        let mut ws = workspace();
        ws.load_sample();
        let query = ws.share_scene(&SceneId::new("home")).unwrap().unwrap();
        let shared = SharedScene::from_query(&query).unwrap();
        assert_eq!(shared.scene.title, "Safe on the Beach");
        assert!(ws.share_scene(&SceneId::new("missing")).is_none());
    }

    #[test]
    fn test_export_reimport() {
        let mut ws = workspace();
        ws.load_sample();
        let json = ws.export_json().unwrap();

        let mut other = workspace();
        other.import_json(&json).unwrap();
        assert_eq!(other.graph(), ws.graph());
    }
}
