//! Choice types for the story graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::scene::SceneId;

/// Unique identifier for a choice within the story graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoiceId(String);

impl ChoiceId {
    /// Create a ChoiceId from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random ChoiceId.
    pub fn generate() -> Self {
        Self(format!("choice_{}", Uuid::new_v4().simple()))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Default label for newly added choices.
pub const DEFAULT_CHOICE_TEXT: &str = "New choice";

/// Directed, labeled edge from its owning scene toward another scene.
///
/// A `None` target means the choice is unlinked. A target that names a
/// scene no longer in the graph is tolerated and treated as unlinked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Identifier.
    pub id: ChoiceId,
    /// Label shown to the reader.
    #[serde(default)]
    pub text: String,
    /// Target scene, if linked.
    #[serde(default)]
    pub target: Option<SceneId>,
}

impl Choice {
    /// Create an unlinked choice with the default label.
    pub fn new(id: ChoiceId) -> Self {
        Self {
            id,
            text: DEFAULT_CHOICE_TEXT.to_string(),
            target: None,
        }
    }

    /// Whether the choice has a target at all.
    pub fn is_linked(&self) -> bool {
        self.target.is_some()
    }
}

/// Partial update for a choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoicePatch {
    /// New label.
    pub text: Option<String>,
    /// New target; `Some(None)` unlinks the choice.
    pub target: Option<Option<SceneId>>,
}

impl ChoicePatch {
    /// Patch that links the choice to a scene.
    pub fn link(target: SceneId) -> Self {
        Self {
            text: None,
            target: Some(Some(target)),
        }
    }

    /// Patch that unlinks the choice.
    pub fn unlink() -> Self {
        Self {
            text: None,
            target: Some(None),
        }
    }

    /// Patch that only relabels the choice.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            target: None,
        }
    }

    pub(crate) fn apply(self, choice: &mut Choice) {
        if let Some(text) = self.text {
            choice.text = text;
        }
        if let Some(target) = self.target {
            choice.target = target;
        }
    }
}
