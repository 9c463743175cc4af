//! Owner of the live story graph.

use tracing::{debug, warn};

use crate::config::KernelConfig;
use crate::host::{ChangeReason, GraphEvent, GraphHost, SubscriptionId, Subscribers};
use crate::store::{Storage, StorageError};
use crate::types::{CanvasBounds, StoryGraph};

/// Holds the live graph, persists it under its own storage key, and
/// notifies subscribers whenever it changes.
///
/// The editor's key is separate from the snapshot log: losing one never
/// corrupts the other.
#[derive(Debug)]
pub struct StoryEditor<S: Storage> {
    graph: StoryGraph,
    storage: S,
    key: String,
    bounds: CanvasBounds,
    subscribers: Subscribers,
}

impl<S: Storage> StoryEditor<S> {
    /// Open the editor, loading the last persisted graph.
    ///
    /// A missing, unreadable, or corrupt payload starts an empty story.
    pub fn open(storage: S, config: &KernelConfig) -> Self {
        let key = config.keys.graph.clone();
        let mut graph = match Self::load(&storage, &key) {
            Ok(Some(graph)) => graph,
            Ok(None) => StoryGraph::new(),
            Err(e) => {
                warn!(error = %e, key = %key, "discarding unreadable story data");
                StoryGraph::new()
            }
        };
        graph.set_bounds(config.canvas);
        graph.normalize();
        debug!(scenes = graph.len(), "editor opened");

        Self {
            graph,
            storage,
            key,
            bounds: config.canvas,
            subscribers: Subscribers::new(),
        }
    }

    fn load(storage: &S, key: &str) -> Result<Option<StoryGraph>, StorageError> {
        match storage.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.graph)
            .map_err(StorageError::from)
            .and_then(|payload| self.storage.set(&self.key, &payload));
        if let Err(e) = result {
            warn!(error = %e, key = %self.key, "failed to persist story data");
        }
    }

    /// The live graph.
    pub fn graph(&self) -> &StoryGraph {
        &self.graph
    }

    /// Run a mutation against the live graph, then persist and notify.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut StoryGraph) -> R) -> R {
        let result = f(&mut self.graph);
        self.persist();
        self.subscribers.notify(&GraphEvent::StateChanged {
            reason: ChangeReason::Edited,
        });
        result
    }

    /// Replace the whole graph.
    pub fn replace(&mut self, mut graph: StoryGraph, reason: ChangeReason) {
        graph.set_bounds(self.bounds);
        graph.normalize();
        self.graph = graph;
        self.persist();
        debug!(%reason, scenes = self.graph.len(), "graph replaced");
        self.subscribers.notify(&GraphEvent::StateChanged { reason });
    }

    /// Register a change listener.
    pub fn subscribe(
        &mut self,
        listener: impl Fn(&GraphEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    /// Remove a change listener.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}

impl<S: Storage> GraphHost for StoryEditor<S> {
    fn read_graph(&self) -> Option<&StoryGraph> {
        Some(&self.graph)
    }

    fn write_graph(&mut self, graph: StoryGraph, reason: ChangeReason) -> bool {
        self.replace(graph, reason);
        true
    }
}
