//! The story graph and its mutation API.
//!
//! Every mutating method leaves the graph invariants intact before returning:
//!
//! - a non-empty graph always has a start scene that exists
//! - no choice targets a scene that was deleted through this API
//! - scene positions lie inside the canvas bounds
//!
//! Operations that name an unknown scene or choice are no-ops. They report
//! the miss through their return value (`false` / `None`) and never fail.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use super::choice::{Choice, ChoiceId, ChoicePatch};
use super::scene::{CanvasBounds, Position, Scene, SceneId, ScenePatch};

/// Difficulty level of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Introductory material.
    Beginner,
    /// Some prior knowledge expected.
    Intermediate,
    /// Expert audience.
    Advanced,
    /// Not set, or an unrecognized value in imported data.
    #[default]
    #[serde(other)]
    Unspecified,
}

/// Story-level metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryMetadata {
    /// Story title.
    pub title: String,
    /// Short description.
    pub description: String,
    /// Subject area.
    pub subject: String,
    /// Difficulty level.
    pub difficulty: Difficulty,
    /// Ordered learning objectives.
    pub learning_objectives: Vec<String>,
    /// Unordered tag set.
    pub tags: BTreeSet<String>,
}

/// Partial update for story metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryMetadataPatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New subject.
    pub subject: Option<String>,
    /// New difficulty.
    pub difficulty: Option<Difficulty>,
    /// Replace the learning objectives.
    pub learning_objectives: Option<Vec<String>>,
    /// Replace the tag set.
    pub tags: Option<BTreeSet<String>>,
}

/// Structural problem found by [`StoryGraph::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphIssue {
    /// The graph has scenes but no valid start scene.
    MissingStart,
    /// A choice targets a scene that does not exist.
    DanglingTarget {
        /// Scene owning the choice.
        scene: SceneId,
        /// The choice.
        choice: ChoiceId,
        /// The missing target.
        target: SceneId,
    },
    /// A choice has no target.
    UnlinkedChoice {
        /// Scene owning the choice.
        scene: SceneId,
        /// The choice.
        choice: ChoiceId,
    },
    /// A scene cannot be reached from the start scene.
    Unreachable(SceneId),
}

impl fmt::Display for GraphIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStart => write!(f, "story has no start scene"),
            Self::DanglingTarget { scene, choice, target } => {
                write!(f, "choice {choice} in {scene} points to missing scene {target}")
            }
            Self::UnlinkedChoice { scene, choice } => {
                write!(f, "choice {choice} in {scene} is not linked")
            }
            Self::Unreachable(scene) => write!(f, "scene {scene} is unreachable from the start"),
        }
    }
}

/// Directed graph of scenes connected by choices.
///
/// Scenes live in a `BTreeMap` so iteration and serialization are
/// deterministic, which keeps content hashes stable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryGraph {
    scenes: BTreeMap<SceneId, Scene>,
    #[serde(default)]
    start_scene_id: Option<SceneId>,
    #[serde(default, rename = "storyMetadata")]
    metadata: StoryMetadata,
    #[serde(skip)]
    bounds: CanvasBounds,
}

// Bounds are editor configuration, not story content.
impl PartialEq for StoryGraph {
    fn eq(&self, other: &Self) -> bool {
        self.scenes == other.scenes
            && self.start_scene_id == other.start_scene_id
            && self.metadata == other.metadata
    }
}

impl StoryGraph {
    /// Create an empty graph with default canvas bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with the given canvas bounds.
    pub fn with_bounds(bounds: CanvasBounds) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    /// Canvas bounds used for clamping.
    pub fn bounds(&self) -> &CanvasBounds {
        &self.bounds
    }

    /// Change the canvas bounds and re-clamp every scene.
    pub fn set_bounds(&mut self, bounds: CanvasBounds) {
        self.bounds = bounds;
        for scene in self.scenes.values_mut() {
            scene.position = bounds.clamp(scene.position);
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Whether the graph has no scenes.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Get a scene by id.
    pub fn scene(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.get(id)
    }

    /// Whether a scene exists.
    pub fn contains(&self, id: &SceneId) -> bool {
        self.scenes.contains_key(id)
    }

    /// Iterate scenes in id order.
    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }

    /// All scene ids in order.
    pub fn scene_ids(&self) -> Vec<SceneId> {
        self.scenes.keys().cloned().collect()
    }

    /// The designated start scene id.
    pub fn start_scene_id(&self) -> Option<&SceneId> {
        self.start_scene_id.as_ref()
    }

    /// The designated start scene.
    pub fn start_scene(&self) -> Option<&Scene> {
        self.start_scene_id.as_ref().and_then(|id| self.scenes.get(id))
    }

    /// Story metadata.
    pub fn metadata(&self) -> &StoryMetadata {
        &self.metadata
    }

    /// Total number of choices across all scenes.
    pub fn choice_count(&self) -> usize {
        self.scenes.values().map(|s| s.choices.len()).sum()
    }

    /// Resolve a choice target, treating dangling references as unlinked.
    pub fn resolve_target(&self, choice: &Choice) -> Option<&Scene> {
        choice.target.as_ref().and_then(|t| self.scenes.get(t))
    }

    /// Scene ids reachable from the start scene (including the start).
    pub fn reachable_from_start(&self) -> BTreeSet<SceneId> {
        let mut seen = BTreeSet::new();
        let Some(start) = self.start_scene() else {
            return seen;
        };

        let mut queue = VecDeque::from([start.id.clone()]);
        seen.insert(start.id.clone());
        while let Some(id) = queue.pop_front() {
            let Some(scene) = self.scenes.get(&id) else {
                continue;
            };
            for choice in &scene.choices {
                if let Some(next) = self.resolve_target(choice) {
                    if seen.insert(next.id.clone()) {
                        queue.push_back(next.id.clone());
                    }
                }
            }
        }
        seen
    }

    /// Report structural problems. An empty list means the story is fully linked.
    pub fn validate(&self) -> Vec<GraphIssue> {
        let mut issues = Vec::new();
        if !self.scenes.is_empty() && self.start_scene().is_none() {
            issues.push(GraphIssue::MissingStart);
        }

        for scene in self.scenes.values() {
            for choice in &scene.choices {
                match &choice.target {
                    None => issues.push(GraphIssue::UnlinkedChoice {
                        scene: scene.id.clone(),
                        choice: choice.id.clone(),
                    }),
                    Some(target) if !self.scenes.contains_key(target) => {
                        issues.push(GraphIssue::DanglingTarget {
                            scene: scene.id.clone(),
                            choice: choice.id.clone(),
                            target: target.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        if self.start_scene().is_some() {
            let reachable = self.reachable_from_start();
            issues.extend(
                self.scenes
                    .keys()
                    .filter(|id| !reachable.contains(*id))
                    .cloned()
                    .map(GraphIssue::Unreachable),
            );
        }
        issues
    }

    // ── Scene mutations ──────────────────────────────────────────────────

    /// Create a scene with default content at `position` (clamped).
    ///
    /// The first scene of an empty graph becomes the start scene.
    pub fn create_scene(&mut self, position: Position) -> SceneId {
        let mut id = SceneId::generate();
        while self.scenes.contains_key(&id) {
            id = SceneId::generate();
        }
        self.insert_scene(Scene::new(id.clone(), position));
        id
    }

    /// Insert a fully built scene, replacing any scene with the same id.
    ///
    /// Used by importers and tests that need fixed ids. The position is
    /// clamped and the start scene assigned if the graph had none.
    pub fn insert_scene(&mut self, mut scene: Scene) {
        scene.position = self.bounds.clamp(scene.position);
        scene.reading_time = scene.reading_time.max(1);
        if self.start_scene().is_none() {
            self.start_scene_id = Some(scene.id.clone());
        }
        self.scenes.insert(scene.id.clone(), scene);
    }

    /// Apply a partial update to a scene. Returns `false` if the scene is unknown.
    pub fn update_scene(&mut self, id: &SceneId, patch: ScenePatch) -> bool {
        let bounds = self.bounds;
        match self.scenes.get_mut(id) {
            Some(scene) => {
                patch.apply(scene, &bounds);
                true
            }
            None => false,
        }
    }

    /// Delete a scene and unlink every choice that targeted it.
    ///
    /// Reassigns the start scene to the first remaining scene (or none).
    pub fn delete_scene(&mut self, id: &SceneId) -> Option<Scene> {
        let removed = self.scenes.remove(id)?;

        for scene in self.scenes.values_mut() {
            for choice in &mut scene.choices {
                if choice.target.as_ref() == Some(id) {
                    choice.target = None;
                }
            }
        }

        if self.start_scene_id.as_ref() == Some(id) {
            self.start_scene_id = self.scenes.keys().next().cloned();
        }
        Some(removed)
    }

    /// Designate a scene as the start. Returns `false` if the scene is unknown.
    pub fn set_start_scene(&mut self, id: &SceneId) -> bool {
        if self.scenes.contains_key(id) {
            self.start_scene_id = Some(id.clone());
            true
        } else {
            false
        }
    }

    // ── Choice mutations ─────────────────────────────────────────────────

    /// Append an unlinked choice with the default label.
    pub fn add_choice(&mut self, scene_id: &SceneId) -> Option<ChoiceId> {
        let mut id = ChoiceId::generate();
        while self.find_choice(&id).is_some() {
            id = ChoiceId::generate();
        }
        let scene = self.scenes.get_mut(scene_id)?;
        scene.choices.push(Choice::new(id.clone()));
        Some(id)
    }

    /// Append a choice already linked to `target`.
    ///
    /// The target must exist; an unknown source or target is a no-op.
    pub fn add_choice_to(&mut self, scene_id: &SceneId, target: &SceneId) -> Option<ChoiceId> {
        if !self.scenes.contains_key(target) {
            return None;
        }
        let id = self.add_choice(scene_id)?;
        self.update_choice(scene_id, &id, ChoicePatch::link(target.clone()));
        Some(id)
    }

    /// Apply a partial update to a choice. Returns `false` if either id is unknown.
    pub fn update_choice(&mut self, scene_id: &SceneId, choice_id: &ChoiceId, patch: ChoicePatch) -> bool {
        let Some(scene) = self.scenes.get_mut(scene_id) else {
            return false;
        };
        match scene.choices.iter_mut().find(|c| &c.id == choice_id) {
            Some(choice) => {
                patch.apply(choice);
                true
            }
            None => false,
        }
    }

    /// Remove a choice from its scene.
    pub fn delete_choice(&mut self, scene_id: &SceneId, choice_id: &ChoiceId) -> Option<Choice> {
        let scene = self.scenes.get_mut(scene_id)?;
        let index = scene.choices.iter().position(|c| &c.id == choice_id)?;
        Some(scene.choices.remove(index))
    }

    /// Locate a choice anywhere in the graph.
    pub fn find_choice(&self, choice_id: &ChoiceId) -> Option<(&Scene, &Choice)> {
        self.scenes
            .values()
            .find_map(|s| s.choice(choice_id).map(|c| (s, c)))
    }

    // ── Metadata and whole-graph maintenance ─────────────────────────────

    /// Apply a partial update to the story metadata.
    pub fn update_metadata(&mut self, patch: StoryMetadataPatch) {
        let meta = &mut self.metadata;
        if let Some(title) = patch.title {
            meta.title = title;
        }
        if let Some(description) = patch.description {
            meta.description = description;
        }
        if let Some(subject) = patch.subject {
            meta.subject = subject;
        }
        if let Some(difficulty) = patch.difficulty {
            meta.difficulty = difficulty;
        }
        if let Some(objectives) = patch.learning_objectives {
            meta.learning_objectives = objectives;
        }
        if let Some(tags) = patch.tags {
            meta.tags = tags;
        }
    }

    /// Re-establish invariants after wholesale replacement.
    ///
    /// Map keys win over ids embedded in scene bodies, positions are clamped,
    /// reading times floored, and the start scene reassigned if it is missing.
    /// Dangling choice targets are left in place; they read as unlinked.
    pub fn normalize(&mut self) {
        let bounds = self.bounds;
        for (id, scene) in self.scenes.iter_mut() {
            if &scene.id != id {
                scene.id = id.clone();
            }
            scene.position = bounds.clamp(scene.position);
            scene.reading_time = scene.reading_time.max(1);
        }
        if self.start_scene().is_none() {
            self.start_scene_id = self.scenes.keys().next().cloned();
        }
    }

    /// Remove every scene and reset metadata.
    pub fn clear(&mut self) {
        self.scenes.clear();
        self.start_scene_id = None;
        self.metadata = StoryMetadata::default();
    }
}
