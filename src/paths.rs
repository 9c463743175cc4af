//! Story path enumeration and analytics.
//!
//! A story path is an acyclic sequence of scenes a reader can traverse from
//! the start scene by following linked choices until the story stops
//! offering a way forward.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use crate::types::{SceneCategory, SceneId, StoryGraph};

/// Reference number of choices per scene that scores 100% complexity.
pub const COMPLEXITY_REFERENCE_CHOICES: f64 = 3.0;

/// Default cap on the number of enumerated paths.
pub const DEFAULT_MAX_PATHS: usize = 100_000;

/// Ordered sequence of scene ids from the start scene to a dead end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StoryPath(Vec<SceneId>);

impl StoryPath {
    /// Scene ids in traversal order.
    pub fn scenes(&self) -> &[SceneId] {
        &self.0
    }

    /// Number of scenes on the path.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path is empty (never true for enumerated paths).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last scene of the path.
    pub fn end(&self) -> Option<&SceneId> {
        self.0.last()
    }
}

impl From<Vec<SceneId>> for StoryPath {
    fn from(ids: Vec<SceneId>) -> Self {
        Self(ids)
    }
}

/// Aggregate metrics derived from a story graph and its paths.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StoryAnalytics {
    /// Number of scenes.
    pub scene_count: usize,
    /// Number of choices.
    pub choice_count: usize,
    /// Choices with no target or a dangling one.
    pub unlinked_choice_count: usize,
    /// Scenes with zero choices.
    pub terminal_scene_count: usize,
    /// Number of distinct paths.
    pub path_count: usize,
    /// Whether enumeration stopped at the path cap.
    pub paths_truncated: bool,
    /// Mean path length in scenes.
    pub average_path_length: f64,
    /// Shortest path length in scenes.
    pub shortest_path_length: usize,
    /// Longest path length in scenes.
    pub longest_path_length: usize,
    /// Minimum and maximum summed reading time over all paths, in minutes.
    /// Sums saturate at `u32::MAX`.
    pub reading_time_range: (u32, u32),
    /// Scene count per category.
    pub category_distribution: BTreeMap<SceneCategory, usize>,
    /// Largest number of choices on a single scene.
    pub max_choices_per_scene: usize,
    /// Mean number of choices per scene.
    pub average_choices_per_scene: f64,
    /// `average_choices_per_scene / 3 * 100`. Not clamped; may exceed 100.
    pub complexity_score: f64,
    /// Scenes not reachable from the start scene.
    pub unreachable_scenes: Vec<SceneId>,
}

/// Enumerates story paths.
///
/// ## Algorithm
///
/// Depth-first from the start scene (or the first scene by id when no start
/// is set). Every branch carries its own visited set holding only the scenes
/// on that branch, so a scene can appear on many paths but never twice on one:
///
/// 1. Visit a scene and add it to the branch's visited set
/// 2. For each choice in order, skip it if it is unlinked, dangling, or
///    targets a scene already on the branch; otherwise descend with a copy
///    of the visited set
/// 3. If no choice descended, record the branch as a completed path
///
/// Identical sequences reached through different choices are reported once.
#[derive(Debug, Clone)]
pub struct PathAnalyzer<'g> {
    graph: &'g StoryGraph,
    max_paths: usize,
}

struct Frame {
    scene: SceneId,
    path: Vec<SceneId>,
    visited: HashSet<SceneId>,
}

impl<'g> PathAnalyzer<'g> {
    /// Create an analyzer with the default path cap.
    pub fn new(graph: &'g StoryGraph) -> Self {
        Self {
            graph,
            max_paths: DEFAULT_MAX_PATHS,
        }
    }

    /// Override the path cap.
    pub fn with_max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = max_paths.max(1);
        self
    }

    fn entry_scene(&self) -> Option<SceneId> {
        self.graph
            .start_scene()
            .map(|s| s.id.clone())
            .or_else(|| self.graph.scenes().next().map(|s| s.id.clone()))
    }

    /// Enumerate paths. The flag is `true` when the cap cut enumeration short.
    pub fn enumerate(&self) -> (Vec<StoryPath>, bool) {
        let mut paths = Vec::new();
        let mut seen: HashSet<Vec<SceneId>> = HashSet::new();
        let Some(entry) = self.entry_scene() else {
            return (paths, false);
        };

        // Explicit stack instead of recursion; children are pushed in reverse
        // so they pop in choice order.
        let mut stack = vec![Frame {
            scene: entry,
            path: Vec::new(),
            visited: HashSet::new(),
        }];

        while let Some(mut frame) = stack.pop() {
            let Some(scene) = self.graph.scene(&frame.scene) else {
                continue;
            };
            frame.path.push(scene.id.clone());
            frame.visited.insert(scene.id.clone());

            let next: Vec<&SceneId> = scene
                .choices
                .iter()
                .filter_map(|c| self.graph.resolve_target(c))
                .map(|s| &s.id)
                .filter(|id| !frame.visited.contains(*id))
                .collect();

            if next.is_empty() {
                if seen.insert(frame.path.clone()) {
                    paths.push(StoryPath(frame.path));
                    if paths.len() >= self.max_paths {
                        debug!(max_paths = self.max_paths, "path enumeration truncated");
                        return (paths, true);
                    }
                }
                continue;
            }

            for id in next.into_iter().rev() {
                stack.push(Frame {
                    scene: id.clone(),
                    path: frame.path.clone(),
                    visited: frame.visited.clone(),
                });
            }
        }

        (paths, false)
    }

    /// Compute aggregate metrics.
    pub fn analyze(&self) -> StoryAnalytics {
        let graph = self.graph;
        if graph.is_empty() {
            return StoryAnalytics::default();
        }

        let (paths, paths_truncated) = self.enumerate();
        let scene_count = graph.len();
        let choice_count = graph.choice_count();

        let mut category_distribution = BTreeMap::new();
        let mut max_choices_per_scene = 0;
        let mut terminal_scene_count = 0;
        let mut unlinked_choice_count = 0;
        for scene in graph.scenes() {
            *category_distribution.entry(scene.category).or_insert(0) += 1;
            max_choices_per_scene = max_choices_per_scene.max(scene.choices.len());
            if scene.is_terminal() {
                terminal_scene_count += 1;
            }
            unlinked_choice_count += scene
                .choices
                .iter()
                .filter(|c| graph.resolve_target(c).is_none())
                .count();
        }

        let lengths: Vec<usize> = paths.iter().map(StoryPath::len).collect();
        let average_path_length = if lengths.is_empty() {
            0.0
        } else {
            lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
        };

        let reading_times: Vec<u32> = paths
            .iter()
            .map(|p| {
                p.scenes()
                    .iter()
                    .filter_map(|id| graph.scene(id))
                    .fold(0u32, |total, s| total.saturating_add(s.reading_time))
            })
            .collect();

        let average_choices_per_scene = choice_count as f64 / scene_count as f64;

        // Every scene on a recorded path is reachable; a truncated run falls
        // back to a plain breadth-first walk.
        let reachable: BTreeSet<SceneId> = if paths_truncated {
            graph.reachable_from_start()
        } else {
            paths.iter().flat_map(|p| p.scenes().iter().cloned()).collect()
        };
        let unreachable_scenes = graph
            .scene_ids()
            .into_iter()
            .filter(|id| !reachable.contains(id))
            .collect();

        StoryAnalytics {
            scene_count,
            choice_count,
            unlinked_choice_count,
            terminal_scene_count,
            path_count: paths.len(),
            paths_truncated,
            average_path_length,
            shortest_path_length: lengths.iter().copied().min().unwrap_or(0),
            longest_path_length: lengths.iter().copied().max().unwrap_or(0),
            reading_time_range: (
                reading_times.iter().copied().min().unwrap_or(0),
                reading_times.iter().copied().max().unwrap_or(0),
            ),
            category_distribution,
            max_choices_per_scene,
            average_choices_per_scene,
            complexity_score: average_choices_per_scene / COMPLEXITY_REFERENCE_CHOICES * 100.0,
            unreachable_scenes,
        }
    }
}

/// Enumerate all story paths with the default cap.
pub fn enumerate_paths(graph: &StoryGraph) -> Vec<StoryPath> {
    PathAnalyzer::new(graph).enumerate().0
}

/// Compute story analytics with the default cap.
pub fn analyze(graph: &StoryGraph) -> StoryAnalytics {
    PathAnalyzer::new(graph).analyze()
}
