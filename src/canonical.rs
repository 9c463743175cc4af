//! Content addressing for story graphs.
//!
//! Snapshots are deduplicated and compared by the hash of their canonical
//! JSON. The serializer streams straight into an xxh64 state, so hashing a
//! graph never materializes its JSON. xxh64 is fast and stable, not
//! cryptographic.
//!
//! ## Determinism Guarantees
//!
//! - Struct fields serialize in declaration order
//! - Vectors serialize in index order
//! - No HashMap in hashed data: scenes and tags live in BTreeMap/BTreeSet
//! - Editor-only state (canvas bounds) is `#[serde(skip)]` and never hashed

use std::io;

use serde::Serialize;
use xxhash_rust::xxh64::Xxh64;

use crate::types::StoryGraph;

/// `io::Write` sink feeding an xxh64 state.
struct HashWriter(Xxh64);

impl io::Write for HashWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Hash the canonical JSON form of a value.
///
/// Fails only for values serde_json cannot represent (e.g. maps with
/// non-string keys).
pub fn canonical_hash<T: Serialize + ?Sized>(value: &T) -> Result<u64, serde_json::Error> {
    let mut writer = HashWriter(Xxh64::new(0));
    serde_json::to_writer(&mut writer, value)?;
    Ok(writer.0.digest())
}

/// Content hash of a story graph. Equal graphs always hash equal.
pub fn graph_hash(graph: &StoryGraph) -> u64 {
    // Every map in StoryGraph is keyed by strings, so serialization cannot fail.
    canonical_hash(graph).expect("Canonical serialization failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CanvasBounds, Position, ScenePatch};

    #[test]
    fn test_determinism() {
        let mut graph = StoryGraph::new();
        graph.create_scene(Position::new(1.0, 2.0));

        let h1 = graph_hash(&graph);
        let h2 = graph_hash(&graph.clone());
        assert_eq!(h1, h2);
        assert_eq!(canonical_hash(&graph).unwrap(), h1);
    }

    #[test]
    fn test_hash_tracks_content() {
        let mut graph = StoryGraph::new();
        let id = graph.create_scene(Position::default());
        let before = graph_hash(&graph);

        graph.update_scene(&id, ScenePatch::title("Harbor"));
        assert_ne!(before, graph_hash(&graph));
    }

    #[test]
    fn test_bounds_not_hashed() {
        let a = StoryGraph::new();
        let b = StoryGraph::with_bounds(CanvasBounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 10.0,
            max_y: 10.0,
        });
        assert_eq!(graph_hash(&a), graph_hash(&b));
    }

    #[test]
    fn test_non_string_keys_rejected() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(vec![1u8], 1);
        assert!(canonical_hash(&map).is_err());
    }
}
