//! # story-graph-kernel
//!
//! Branching story graphs with path analytics and snapshot history.
//!
//! A story is a set of scenes joined by choices. The kernel answers two
//! questions:
//!
//! > Which complete reading paths does this story contain?
//!
//! > What did the story look like before the last edit?
//!
//! ## Architecture
//!
//! ```text
//! StoryEditor (live graph) ──tick──→ History ──→ SnapshotLog ──→ Storage
//!       ↑                              │
//!       └──────── undo / redo ─────────┘
//!
//! StoryGraph ──→ PathAnalyzer ──→ StoryAnalytics
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Scenes are stored in a `BTreeMap`, so iteration, export, and hashing
//!   are ordered by scene id
//! - Same graph content → same content hash, regardless of canvas bounds
//! - Path enumeration visits choices in authored order

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod canonical;
pub mod config;
pub mod store;
pub mod host;
pub mod editor;
pub mod history;
pub mod paths;
pub mod playthrough;
pub mod exchange;
pub mod workspace;

#[cfg(feature = "autosave")]
pub mod autosave;

// Re-exports
pub use types::{
    CanvasBounds, Choice, ChoiceId, ChoicePatch, Difficulty, GraphIssue, Illustration,
    IllustrationKind, LearningHint, Position, Scene, SceneCategory, SceneId, ScenePatch,
    StoryGraph, StoryMetadata, StoryMetadataPatch,
};
pub use canonical::{canonical_hash, graph_hash};
pub use config::{ConfigError, KernelConfig, StorageKeys};
pub use store::{FileStorage, InMemoryStorage, Storage, StorageError};
pub use host::{ChangeReason, GraphEvent, GraphHost, SubscriptionId};
pub use editor::StoryEditor;
pub use history::{
    ChangeTracker, History, HistoryOutcome, Snapshot, SnapshotId, SnapshotKind, SnapshotLog,
    SnapshotMeta, TickOutcome,
};
pub use paths::{analyze, enumerate_paths, PathAnalyzer, StoryAnalytics, StoryPath};
pub use playthrough::Playthrough;
pub use exchange::{
    export_document, parse_document, sample_story, FormatError, SharedScene, STORY_SCHEMA_VERSION,
};
pub use workspace::Workspace;

#[cfg(feature = "autosave")]
pub use autosave::{AutosaveError, AutosaveLoop, MIN_AUTOSAVE_INTERVAL};
