//! Golden tests for the story graph and path analyzer.
//!
//! These tests pin down the literal behaviors authors rely on: start
//! selection, path shapes over cycles and rejoins, and the structural
//! invariants every mutation sequence must preserve.

use proptest::prelude::*;

use story_graph_kernel::{
    analyze, enumerate_paths, graph_hash, parse_document, sample_story, ChoicePatch,
    PathAnalyzer, Position, SceneId, ScenePatch, StoryGraph,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn ids(path: &[&str]) -> Vec<SceneId> {
    path.iter().map(|s| SceneId::new(*s)).collect()
}

fn linear_graph(n: usize) -> (StoryGraph, Vec<SceneId>) {
    let mut graph = StoryGraph::new();
    let scenes: Vec<SceneId> = (0..n)
        .map(|i| graph.create_scene(Position::new(i as f64 * 100.0, 0.0)))
        .collect();
    for pair in scenes.windows(2) {
        graph.add_choice_to(&pair[0], &pair[1]);
    }
    (graph, scenes)
}

// ─────────────────────────────────────────────────────────────────────────────
// Start Selection
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_two_scenes_one_choice_yields_one_path() {
    let mut graph = StoryGraph::new();
    let s1 = graph.create_scene(Position::new(100.0, 100.0));
    let s2 = graph.create_scene(Position::new(400.0, 100.0));
    let choice = graph.add_choice(&s1).unwrap();
    assert!(graph.update_choice(&s1, &choice, ChoicePatch::link(s2.clone())));

    assert_eq!(graph.start_scene_id(), Some(&s1));
    let paths = enumerate_paths(&graph);
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].scenes(), &[s1, s2][..]);
}

#[test]
fn test_deleting_start_reassigns() {
    let (mut graph, scenes) = linear_graph(3);
    graph.delete_scene(&scenes[0]);
    let start = graph.start_scene_id().unwrap();
    assert!(start == &scenes[1] || start == &scenes[2]);
    assert!(graph.contains(start));
}

// ─────────────────────────────────────────────────────────────────────────────
// Path Shapes
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_single_terminal_start() {
    let mut graph = StoryGraph::new();
    graph.create_scene(Position::default());
    let analytics = analyze(&graph);
    assert_eq!(analytics.path_count, 1);
    assert_eq!(analytics.shortest_path_length, 1);
    assert_eq!(analytics.longest_path_length, 1);
}

#[test]
fn test_empty_graph_all_zero() {
    let graph = StoryGraph::new();
    assert!(enumerate_paths(&graph).is_empty());
    let analytics = analyze(&graph);
    assert_eq!(analytics.scene_count, 0);
    assert_eq!(analytics.path_count, 0);
    assert_eq!(analytics.average_path_length, 0.0);
    assert_eq!(analytics.complexity_score, 0.0);
}

#[test]
fn test_rejoin_allows_revisit_on_different_branches() {
    // a → b → d, a → c → d, d → a (back-edge)
    let graph = parse_document(
        r#"{
            "scenes": {
                "a": {"id": "a", "choices": [{"id": "1", "target": "b"}, {"id": "2", "target": "c"}]},
                "b": {"id": "b", "choices": [{"id": "3", "target": "d"}]},
                "c": {"id": "c", "choices": [{"id": "4", "target": "d"}]},
                "d": {"id": "d", "choices": [{"id": "5", "target": "a"}]}
            },
            "startSceneId": "a"
        }"#,
    )
    .unwrap();

    let paths: Vec<Vec<SceneId>> = enumerate_paths(&graph)
        .into_iter()
        .map(|p| p.scenes().to_vec())
        .collect();
    assert_eq!(paths, vec![ids(&["a", "b", "d"]), ids(&["a", "c", "d"])]);
}

#[test]
fn test_long_cycle_terminates() {
    let (mut graph, scenes) = linear_graph(50);
    graph.add_choice_to(&scenes[49], &scenes[0]);
    let paths = enumerate_paths(&graph);
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].len(), 50);
}

#[test]
fn test_path_cap_flags_truncation() {
    // Ten binary forks: 1024 paths.
    let mut graph = StoryGraph::new();
    let mut join = graph.create_scene(Position::default());
    for _ in 0..10 {
        let left = graph.create_scene(Position::default());
        let right = graph.create_scene(Position::default());
        let next = graph.create_scene(Position::default());
        graph.add_choice_to(&join, &left);
        graph.add_choice_to(&join, &right);
        graph.add_choice_to(&left, &next);
        graph.add_choice_to(&right, &next);
        join = next;
    }
    assert_eq!(enumerate_paths(&graph).len(), 1024);

    let analytics = PathAnalyzer::new(&graph).with_max_paths(100).analyze();
    assert!(analytics.paths_truncated);
    assert_eq!(analytics.path_count, 100);
    assert!(analytics.unreachable_scenes.is_empty());
}

#[test]
fn test_sample_story_analytics() {
    let analytics = analyze(&sample_story());
    assert_eq!(analytics.scene_count, 6);
    assert_eq!(analytics.choice_count, 7);
    assert_eq!(analytics.path_count, 2);
    assert_eq!(analytics.terminal_scene_count, 1);
    assert_eq!(analytics.reading_time_range, (10, 10));
    assert!(analytics.unreachable_scenes.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_hash_ignores_insertion_order() {
    let a = parse_document(r#"{"scenes": {"x": {"id": "x"}, "y": {"id": "y"}}, "startSceneId": "x"}"#)
        .unwrap();
    let b = parse_document(r#"{"scenes": {"y": {"id": "y"}, "x": {"id": "x"}}, "startSceneId": "x"}"#)
        .unwrap();
    assert_eq!(graph_hash(&a), graph_hash(&b));
}

#[test]
fn test_paths_stable_across_runs() {
    let graph = sample_story();
    let first = enumerate_paths(&graph);
    for _ in 0..100 {
        assert_eq!(enumerate_paths(&graph), first);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Structural Invariants
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Create(f64, f64),
    Delete(usize),
    AddChoice(usize, usize),
    Unlink(usize),
    Move(usize, f64, f64),
    SetStart(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-500.0..4000.0f64, -500.0..3000.0f64).prop_map(|(x, y)| Op::Create(x, y)),
        any::<usize>().prop_map(Op::Delete),
        (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::AddChoice(a, b)),
        any::<usize>().prop_map(Op::Unlink),
        (any::<usize>(), -500.0..4000.0f64, -500.0..3000.0f64).prop_map(|(i, x, y)| Op::Move(i, x, y)),
        any::<usize>().prop_map(Op::SetStart),
    ]
}

fn pick(graph: &StoryGraph, i: usize) -> Option<SceneId> {
    let ids = graph.scene_ids();
    (!ids.is_empty()).then(|| ids[i % ids.len()].clone())
}

fn apply(graph: &mut StoryGraph, op: Op) {
    match op {
        Op::Create(x, y) => {
            graph.create_scene(Position::new(x, y));
        }
        Op::Delete(i) => {
            if let Some(id) = pick(graph, i) {
                graph.delete_scene(&id);
            }
        }
        Op::AddChoice(a, b) => {
            if let (Some(from), Some(to)) = (pick(graph, a), pick(graph, b)) {
                graph.add_choice_to(&from, &to);
            }
        }
        Op::Unlink(i) => {
            if let Some(id) = pick(graph, i) {
                let first = graph.scene(&id).and_then(|s| s.choices.first()).map(|c| c.id.clone());
                if let Some(choice) = first {
                    graph.update_choice(&id, &choice, ChoicePatch::unlink());
                }
            }
        }
        Op::Move(i, x, y) => {
            if let Some(id) = pick(graph, i) {
                graph.update_scene(&id, ScenePatch::position(Position::new(x, y)));
            }
        }
        Op::SetStart(i) => {
            if let Some(id) = pick(graph, i) {
                graph.set_start_scene(&id);
            }
        }
    }
}

proptest! {
    #[test]
    fn test_mutations_preserve_invariants(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut graph = StoryGraph::new();
        for op in ops {
            apply(&mut graph, op);
        }

        // Start scene exists iff the graph is non-empty.
        prop_assert_eq!(graph.start_scene().is_some(), !graph.is_empty());

        for scene in graph.scenes() {
            // Every target resolves; deletes null out inbound targets.
            for choice in &scene.choices {
                if let Some(target) = &choice.target {
                    prop_assert!(graph.contains(target));
                }
            }
            prop_assert!(graph.bounds().contains(scene.position));
        }

        // Every path starts at the start scene and never repeats a scene.
        for path in enumerate_paths(&graph) {
            prop_assert_eq!(path.scenes().first(), graph.start_scene_id());
            let unique: std::collections::HashSet<_> = path.scenes().iter().collect();
            prop_assert_eq!(unique.len(), path.len());
        }
    }
}
