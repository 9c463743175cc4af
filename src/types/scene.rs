//! Scene types for the story graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::choice::Choice;

/// Unique identifier for a scene in the story graph.
///
/// Wraps a string so imported stories keep their original ids.
/// Implements `Ord` for deterministic ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(String);

impl SceneId {
    /// Create a SceneId from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random SceneId.
    pub fn generate() -> Self {
        Self(format!("scene_{}", Uuid::new_v4().simple()))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Rectangular region of the editing canvas that scene positions are clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasBounds {
    /// Smallest allowed x.
    pub min_x: f64,
    /// Smallest allowed y.
    pub min_y: f64,
    /// Largest allowed x.
    pub max_x: f64,
    /// Largest allowed y.
    pub max_y: f64,
}

impl CanvasBounds {
    /// Clamp a position into the bounds. Non-finite coordinates fall back to the minimum.
    pub fn clamp(&self, position: Position) -> Position {
        let clamp_axis = |v: f64, lo: f64, hi: f64| {
            if v.is_finite() {
                v.clamp(lo, hi)
            } else {
                lo
            }
        };
        Position {
            x: clamp_axis(position.x, self.min_x, self.max_x),
            y: clamp_axis(position.y, self.min_y, self.max_y),
        }
    }

    /// Check whether a position already lies inside the bounds.
    pub fn contains(&self, position: Position) -> bool {
        (self.min_x..=self.max_x).contains(&position.x)
            && (self.min_y..=self.max_y).contains(&position.y)
    }
}

impl Default for CanvasBounds {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 2800.0,
            max_y: 1800.0,
        }
    }
}

/// 2-D position of a scene card on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a new position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Category tag of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneCategory {
    /// Plain story beat.
    Narrative,
    /// Scene that asks the reader something.
    Question,
    /// Reference or explanatory content.
    Information,
    /// Branch point where the reader decides.
    Decision,
}

impl SceneCategory {
    /// All categories in declaration order.
    pub const ALL: [SceneCategory; 4] = [
        Self::Narrative,
        Self::Question,
        Self::Information,
        Self::Decision,
    ];

    /// Parse category from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "narrative" => Some(Self::Narrative),
            "question" => Some(Self::Question),
            "information" => Some(Self::Information),
            "decision" => Some(Self::Decision),
            _ => None,
        }
    }
}

impl Default for SceneCategory {
    fn default() -> Self {
        Self::Narrative
    }
}

impl fmt::Display for SceneCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Narrative => write!(f, "narrative"),
            Self::Question => write!(f, "question"),
            Self::Information => write!(f, "information"),
            Self::Decision => write!(f, "decision"),
        }
    }
}

/// Where a scene illustration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IllustrationKind {
    /// Image uploaded by the author (payload is a data URL).
    Upload,
    /// Image picked from a search (payload is a URL).
    Search,
    /// Single emoji (payload is the emoji itself).
    Emoji,
}

/// Optional illustration attached to a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Illustration {
    /// Source of the illustration.
    #[serde(rename = "type")]
    pub kind: IllustrationKind,
    /// Payload interpreted according to `kind`.
    pub data: String,
}

/// A learning hint shown alongside a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningHint {
    /// Hint identifier, unique within its scene.
    pub id: String,
    /// Hint text.
    pub text: String,
}

/// Default title for newly created scenes.
pub const DEFAULT_SCENE_TITLE: &str = "New Scene";

fn default_reading_time() -> u32 {
    1
}

/// One narrative beat in the story graph.
///
/// The scene exclusively owns its choices. Field names serialize in camelCase
/// to match the story export format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Immutable identifier.
    pub id: SceneId,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub content: String,
    /// Canvas position.
    #[serde(default)]
    pub position: Position,
    /// Outgoing choices in display order.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Optional illustration.
    #[serde(default, rename = "image", skip_serializing_if = "Option::is_none")]
    pub illustration: Option<Illustration>,
    /// Category tag.
    #[serde(default)]
    pub category: SceneCategory,
    /// Learning hints.
    #[serde(default)]
    pub hints: Vec<LearningHint>,
    /// Free-text author notes.
    #[serde(default)]
    pub notes: String,
    /// Estimated reading time in minutes (always at least 1).
    #[serde(default = "default_reading_time")]
    pub reading_time: u32,
}

impl Scene {
    /// Create a scene with default content at the given position.
    pub fn new(id: SceneId, position: Position) -> Self {
        Self {
            id,
            title: DEFAULT_SCENE_TITLE.to_string(),
            content: String::new(),
            position,
            choices: Vec::new(),
            illustration: None,
            category: SceneCategory::default(),
            hints: Vec::new(),
            notes: String::new(),
            reading_time: default_reading_time(),
        }
    }

    /// A terminal scene has no outgoing choices.
    pub fn is_terminal(&self) -> bool {
        self.choices.is_empty()
    }

    /// Find a choice by id.
    pub fn choice(&self, id: &super::ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|c| &c.id == id)
    }
}

/// Partial update for a scene. `None` fields are left untouched.
///
/// The scene id is deliberately absent: ids never change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePatch {
    /// New title.
    pub title: Option<String>,
    /// New body text.
    pub content: Option<String>,
    /// New position (clamped on apply).
    pub position: Option<Position>,
    /// Replace the illustration; `Some(None)` removes it.
    pub illustration: Option<Option<Illustration>>,
    /// New category.
    pub category: Option<SceneCategory>,
    /// Replace all hints.
    pub hints: Option<Vec<LearningHint>>,
    /// New notes.
    pub notes: Option<String>,
    /// New reading time (floored at 1).
    pub reading_time: Option<u32>,
}

impl ScenePatch {
    /// Patch that only sets the title.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Patch that only moves the scene.
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub(crate) fn apply(self, scene: &mut Scene, bounds: &CanvasBounds) {
        if let Some(title) = self.title {
            scene.title = title;
        }
        if let Some(content) = self.content {
            scene.content = content;
        }
        if let Some(position) = self.position {
            scene.position = bounds.clamp(position);
        }
        if let Some(illustration) = self.illustration {
            scene.illustration = illustration;
        }
        if let Some(category) = self.category {
            scene.category = category;
        }
        if let Some(hints) = self.hints {
            scene.hints = hints;
        }
        if let Some(notes) = self.notes {
            scene.notes = notes;
        }
        if let Some(minutes) = self.reading_time {
            scene.reading_time = minutes.max(1);
        }
    }
}
