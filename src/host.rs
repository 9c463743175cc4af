//! Contract between the kernel and whatever owns the live graph.
//!
//! Renderers and UI layers depend on exactly two operations, reading the
//! current graph and replacing it, plus a typed change subscription.

use std::fmt;

use crate::types::StoryGraph;

/// Owner of the live story graph.
pub trait GraphHost {
    /// Current graph, or `None` if no graph is exposed yet.
    fn read_graph(&self) -> Option<&StoryGraph>;

    /// Replace the live graph. Returns whether the write succeeded.
    ///
    /// Implementations must notify their subscribers after a successful write.
    fn write_graph(&mut self, graph: StoryGraph, reason: ChangeReason) -> bool;
}

/// Why the live graph changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeReason {
    /// Direct author edit.
    Edited,
    /// Undo, redo, or explicit restore from history.
    Restored,
    /// Imported from an export document.
    Imported,
    /// Replaced by the bundled sample story.
    SampleLoaded,
    /// Story cleared.
    Cleared,
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Edited => write!(f, "edited"),
            Self::Restored => write!(f, "restored"),
            Self::Imported => write!(f, "imported"),
            Self::SampleLoaded => write!(f, "sample_loaded"),
            Self::Cleared => write!(f, "cleared"),
        }
    }
}

/// Event delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEvent {
    /// The live graph changed.
    StateChanged {
        /// Cause of the change.
        reason: ChangeReason,
    },
}

/// Handle returned by [`Subscribers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&GraphEvent) + Send + Sync>;

/// Registry of change listeners.
#[derive(Default)]
pub struct Subscribers {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl Subscribers {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn subscribe(&mut self, listener: impl Fn(&GraphEvent) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Deliver an event to every listener in subscription order.
    pub fn notify(&self, event: &GraphEvent) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
