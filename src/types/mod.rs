//! Core types for the story graph.

pub mod scene;
pub mod choice;
pub mod graph;

pub use scene::{
    SceneId, Scene, ScenePatch, Position, CanvasBounds, SceneCategory,
    Illustration, IllustrationKind, LearningHint, DEFAULT_SCENE_TITLE,
};
pub use choice::{ChoiceId, Choice, ChoicePatch, DEFAULT_CHOICE_TEXT};
pub use graph::{StoryGraph, StoryMetadata, StoryMetadataPatch, Difficulty, GraphIssue};
