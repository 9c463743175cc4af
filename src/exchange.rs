//! Story export/import, shareable scene links, and the bundled sample story.
//!
//! ## Export Format
//!
//! ```json
//! { "schemaVersion": "1.0.0", "scenes": { "<id>": Scene, ... }, "startSceneId": "<id>" | null, "storyMetadata": { ... } }
//! ```
//!
//! `schemaVersion` is optional on import; documents without it are read as
//! the current version. A different major version is rejected.
//!
//! Import checks the document shape before deserializing anything, so a
//! malformed payload is rejected without touching the caller's state.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{
    ChoicePatch, Difficulty, Position, Scene, SceneCategory, SceneId, ScenePatch, StoryGraph,
    StoryMetadataPatch,
};

/// Schema version written into exported documents.
/// Increment the major part on breaking changes to the format.
pub const STORY_SCHEMA_VERSION: &str = "1.0.0";

/// Field carrying the schema version in an export document.
const SCHEMA_VERSION_FIELD: &str = "schemaVersion";

/// Query parameter carrying a shared scene.
pub const SHARE_QUERY_PARAM: &str = "scene";

/// Error for payloads that fail structural validation.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Not valid JSON at all.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Top level is not an object.
    #[error("Story document must be a JSON object")]
    NotAnObject,
    /// No `scenes` field.
    #[error("Story document has no scenes")]
    MissingScenes,
    /// `scenes` is present but not an object.
    #[error("Story scenes must be an object keyed by scene id")]
    ScenesNotObject,
    /// Written by an incompatible version of the format.
    #[error("Unsupported story schema version {found} (expected {})", STORY_SCHEMA_VERSION)]
    UnsupportedVersion {
        /// Version found in the document.
        found: String,
    },
    /// Shape was right but a field had the wrong type.
    #[error("Invalid story document: {0}")]
    InvalidDocument(String),
    /// Share link could not be decoded.
    #[error("Invalid share link: {0}")]
    InvalidShareLink(String),
}

/// Parse and validate an exported story document.
pub fn parse_document(json: &str) -> Result<StoryGraph, FormatError> {
    let value: Value = serde_json::from_str(json)?;
    let Some(object) = value.as_object() else {
        return Err(FormatError::NotAnObject);
    };
    match object.get(SCHEMA_VERSION_FIELD) {
        None | Some(Value::Null) => {}
        Some(Value::String(found)) if major(found) == major(STORY_SCHEMA_VERSION) => {}
        Some(other) => {
            let found = other.as_str().map_or_else(|| other.to_string(), str::to_string);
            return Err(FormatError::UnsupportedVersion { found });
        }
    }
    match object.get("scenes") {
        None | Some(Value::Null) => return Err(FormatError::MissingScenes),
        Some(Value::Object(_)) => {}
        Some(_) => return Err(FormatError::ScenesNotObject),
    }

    let mut graph: StoryGraph =
        serde_json::from_value(value).map_err(|e| FormatError::InvalidDocument(e.to_string()))?;
    graph.normalize();
    Ok(graph)
}

fn major(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

/// Serialize a story to the export format.
pub fn export_document(graph: &StoryGraph) -> Result<String, FormatError> {
    let mut value = serde_json::to_value(graph)?;
    if let Value::Object(object) = &mut value {
        object.insert(
            SCHEMA_VERSION_FIELD.to_string(),
            Value::String(STORY_SCHEMA_VERSION.to_string()),
        );
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

/// A single scene plus the story title, as carried in a share link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedScene {
    /// The shared scene.
    pub scene: Scene,
    /// Title of the story it came from.
    pub story_title: String,
}

impl SharedScene {
    /// Build a share payload for a scene of the graph.
    pub fn from_graph(graph: &StoryGraph, id: &SceneId) -> Option<Self> {
        graph.scene(id).map(|scene| Self {
            scene: scene.clone(),
            story_title: graph.metadata().title.clone(),
        })
    }

    /// Encode as URL-safe base64 (no padding).
    pub fn encode(&self) -> Result<String, FormatError> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Query string fragment `scene=<encoded>`.
    pub fn to_query(&self) -> Result<String, FormatError> {
        Ok(format!("{SHARE_QUERY_PARAM}={}", self.encode()?))
    }

    /// Decode a share payload. Accepts standard or URL-safe alphabets,
    /// with or without padding.
    pub fn decode(encoded: &str) -> Result<Self, FormatError> {
        let normalized: String = encoded
            .trim()
            .trim_end_matches('=')
            .chars()
            .map(|c| match c {
                '+' => '-',
                '/' => '_',
                c => c,
            })
            .collect();
        if normalized.is_empty() {
            return Err(FormatError::InvalidShareLink("empty payload".to_string()));
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(normalized.as_bytes())
            .map_err(|e| FormatError::InvalidShareLink(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| FormatError::InvalidShareLink(e.to_string()))
    }

    /// Find the `scene` parameter in a query string (leading `?` optional) and decode it.
    pub fn from_query(query: &str) -> Result<Self, FormatError> {
        let encoded = query
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == SHARE_QUERY_PARAM)
            .map(|(_, value)| value)
            .ok_or_else(|| FormatError::InvalidShareLink("missing scene parameter".to_string()))?;
        Self::decode(encoded)
    }
}

/// A small branching story used to demo the editor.
pub fn sample_story() -> StoryGraph {
    let mut graph = StoryGraph::new();
    let specs: [(&str, &str, &str, SceneCategory, (f64, f64)); 6] = [
        ("intro", "The Tide Pool", "The tide is out and the rocks are full of life.", SceneCategory::Narrative, (80.0, 200.0)),
        ("question", "What Lives Here?", "Which creature do you want to look at first?", SceneCategory::Question, (380.0, 200.0)),
        ("crab", "Hermit Crab", "Hermit crabs borrow empty shells and trade up as they grow.", SceneCategory::Information, (680.0, 80.0)),
        ("anemone", "Sea Anemone", "Anemones sting small prey with their tentacles.", SceneCategory::Information, (680.0, 320.0)),
        ("decide", "Tide Coming In", "The water is rising. Stay or head back?", SceneCategory::Decision, (980.0, 200.0)),
        ("home", "Safe on the Beach", "You made it back with a notebook full of sketches.", SceneCategory::Narrative, (1280.0, 200.0)),
    ];
    for (id, title, content, category, (x, y)) in specs {
        let id = SceneId::new(id);
        graph.insert_scene(Scene::new(id.clone(), Position::new(x, y)));
        graph.update_scene(
            &id,
            ScenePatch {
                title: Some(title.to_string()),
                content: Some(content.to_string()),
                category: Some(category),
                reading_time: Some(2),
                ..ScenePatch::default()
            },
        );
    }

    let links = [
        ("intro", "question", "Look closer"),
        ("question", "crab", "The crab"),
        ("question", "anemone", "The anemone"),
        ("crab", "decide", "Keep exploring"),
        ("anemone", "decide", "Keep exploring"),
        ("decide", "question", "Stay a little longer"),
        ("decide", "home", "Head back"),
    ];
    for (from, to, label) in links {
        let from = SceneId::new(from);
        if let Some(choice) = graph.add_choice_to(&from, &SceneId::new(to)) {
            graph.update_choice(&from, &choice, ChoicePatch::text(label));
        }
    }

    graph.set_start_scene(&SceneId::new("intro"));
    graph.update_metadata(StoryMetadataPatch {
        title: Some("Tide Pool Explorer".to_string()),
        description: Some("A short branching walk through a rocky shore.".to_string()),
        subject: Some("Marine biology".to_string()),
        difficulty: Some(Difficulty::Beginner),
        learning_objectives: Some(vec![
            "Name two tide pool animals".to_string(),
            "Explain why tides matter to shore life".to_string(),
        ]),
        tags: Some(["ocean", "biology"].into_iter().map(String::from).collect()),
    });
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::enumerate_paths;

    #[test]
    fn test_rejects_non_object_scenes() {
        assert!(matches!(
            parse_document(r#"{"scenes": "not-an-object"}"#),
            Err(FormatError::ScenesNotObject)
        ));
        assert!(matches!(parse_document(r#"{"startSceneId": null}"#), Err(FormatError::MissingScenes)));
        assert!(matches!(parse_document("[]"), Err(FormatError::NotAnObject)));
        assert!(matches!(parse_document("{"), Err(FormatError::Json(_))));
        assert!(matches!(
            parse_document(r#"{"scenes": {"a": {"id": "a", "choices": 7}}}"#),
            Err(FormatError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_export_import_preserves_story() {
        let graph = sample_story();
        let json = export_document(&graph).unwrap();
        assert!(json.contains("\"startSceneId\""));
        assert!(json.contains("\"storyMetadata\""));
        assert!(json.contains("\"schemaVersion\": \"1.0.0\""));
        let parsed = parse_document(&json).unwrap();
        assert_eq!(parsed, graph);
    }

    #[test]
    fn test_schema_version_checked() {
        let minor_bump = r#"{"schemaVersion": "1.4.0", "scenes": {"a": {"id": "a"}}}"#;
        assert_eq!(parse_document(minor_bump).unwrap().len(), 1);

        match parse_document(r#"{"schemaVersion": "2.0.0", "scenes": {}}"#) {
            Err(FormatError::UnsupportedVersion { found }) => assert_eq!(found, "2.0.0"),
            other => panic!("expected version error, got {other:?}"),
        }
        assert!(matches!(
            parse_document(r#"{"schemaVersion": 1, "scenes": {}}"#),
            Err(FormatError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_import_minimal_document() {
        let graph = parse_document(r#"{"scenes": {"s1": {"id": "s1", "title": "Only"}}}"#).unwrap();
        assert_eq!(graph.start_scene_id(), Some(&SceneId::new("s1")));
        assert_eq!(graph.metadata().difficulty, Difficulty::Unspecified);
    }

    #[test]
    fn test_share_link_roundtrip() {
        let graph = sample_story();
        let shared = SharedScene::from_graph(&graph, &SceneId::new("crab")).unwrap();
        let query = shared.to_query().unwrap();
        assert!(query.starts_with("scene="));

        let decoded = SharedScene::from_query(&format!("?ref=x&{query}")).unwrap();
        assert_eq!(decoded, shared);
        assert_eq!(decoded.story_title, "Tide Pool Explorer");
    }

    #[test]
    fn test_share_link_accepts_standard_alphabet() {
        let graph = sample_story();
        let shared = SharedScene::from_graph(&graph, &SceneId::new("intro")).unwrap();
        let standard = base64::engine::general_purpose::STANDARD.encode(serde_json::to_vec(&shared).unwrap());
        assert_eq!(SharedScene::decode(&standard).unwrap(), shared);
    }

    #[test]
    fn test_malformed_share_links() {
        assert!(matches!(SharedScene::decode("%%%"), Err(FormatError::InvalidShareLink(_))));
        assert!(matches!(SharedScene::decode(""), Err(FormatError::InvalidShareLink(_))));
        // Valid base64 of something that is not a shared scene.
        let junk = URL_SAFE_NO_PAD.encode(b"{\"hello\": 1}");
        assert!(matches!(SharedScene::decode(&junk), Err(FormatError::InvalidShareLink(_))));
        assert!(matches!(SharedScene::from_query("a=b"), Err(FormatError::InvalidShareLink(_))));
    }

    #[test]
    fn test_sample_story_shape() {
        let graph = sample_story();
        assert_eq!(graph.len(), 6);
        assert!(graph.validate().is_empty());
        // intro → question → {crab, anemone} → decide → home
        assert_eq!(enumerate_paths(&graph).len(), 2);
    }
}
