//! Reader-side traversal of a story.

use crate::types::{Choice, ChoiceId, Scene, StoryGraph};

/// A reader's walk through a story, starting at the start scene.
///
/// Only linked choices whose target exists can be taken. The trail keeps
/// every visited scene so `back` can step out of loops.
#[derive(Debug, Clone)]
pub struct Playthrough<'g> {
    graph: &'g StoryGraph,
    trail: Vec<&'g Scene>,
}

impl<'g> Playthrough<'g> {
    /// Begin at the start scene. `None` if the story has no start.
    pub fn new(graph: &'g StoryGraph) -> Option<Self> {
        let start = graph.start_scene()?;
        Some(Self {
            graph,
            trail: vec![start],
        })
    }

    /// Scene currently being read.
    pub fn current(&self) -> &'g Scene {
        // The trail is never empty: `new` seeds it and `back` keeps the first entry.
        self.trail[self.trail.len() - 1]
    }

    /// Choices the reader can take from here.
    pub fn available_choices(&self) -> impl Iterator<Item = &'g Choice> + '_ {
        let graph = self.graph;
        self.current()
            .choices
            .iter()
            .filter(move |c| graph.resolve_target(c).is_some())
    }

    /// Take a choice. Returns the new scene, or `None` if the choice is not
    /// on this scene or leads nowhere.
    pub fn choose(&mut self, choice: &ChoiceId) -> Option<&'g Scene> {
        let graph = self.graph;
        let next = self
            .current()
            .choice(choice)
            .and_then(|c| graph.resolve_target(c))?;
        self.trail.push(next);
        Some(next)
    }

    /// Step back one scene. Returns `false` at the start.
    pub fn back(&mut self) -> bool {
        if self.trail.len() > 1 {
            self.trail.pop();
            true
        } else {
            false
        }
    }

    /// Return to the start scene.
    pub fn restart(&mut self) {
        self.trail.truncate(1);
    }

    /// Whether no choice can be taken from here.
    pub fn is_finished(&self) -> bool {
        self.available_choices().next().is_none()
    }

    /// Whether the current scene has no choices at all.
    pub fn is_terminal(&self) -> bool {
        self.current().is_terminal()
    }

    /// Visited scenes, start first.
    pub fn trail(&self) -> &[&'g Scene] {
        &self.trail
    }

    /// Sum of reading times along the trail, in minutes. Saturates at `u32::MAX`.
    pub fn elapsed_reading_time(&self) -> u32 {
        self.trail
            .iter()
            .fold(0u32, |total, s| total.saturating_add(s.reading_time))
    }
}
