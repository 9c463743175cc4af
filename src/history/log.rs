//! Bounded, deduplicated snapshot log.
//!
//! The log is the durable record of graph states. It is append-mostly:
//! entries are added by autosave and by undo/redo/restore bookkeeping,
//! removed by FIFO eviction or by explicit user deletion.
//!
//! ## Identity
//!
//! Every entry gets a [`SnapshotId`] from a monotonically increasing
//! counter. Ids survive eviction and deletion of other entries, so a history
//! list that holds an id always refers to the entry it showed.
//!
//! ## Persisted Layout
//!
//! ```text
//! snapshots  → [{"id", "timestamp", "data": <story document>, "meta": {"title", "kind"}}, ...]
//! lastSaved  → RFC 3339 timestamp of the last commit
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, warn};

use crate::canonical::graph_hash;
use crate::config::{KernelConfig, StorageKeys};
use crate::store::{Storage, StorageError};
use crate::types::StoryGraph;

/// Title recorded for stories without one.
pub const UNTITLED_STORY: &str = "Untitled Story";

/// Stored ids at or above this are treated as corrupt and the log is renumbered.
const MAX_STORED_ID: u64 = u64::MAX >> 1;

/// Stable identity of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(u64);

impl SnapshotId {
    /// Raw counter value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a snapshot was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    /// Captured by the change tracker.
    #[default]
    Autosave,
    /// Live state saved before an explicit restore.
    Restore,
    /// Live state saved before an undo.
    Undo,
    /// Live state saved before a redo.
    Redo,
}

impl SnapshotKind {
    /// Checkpoints are candidates for undo. Undo/redo bookkeeping entries
    /// are reachable through the redo stack instead.
    pub fn is_checkpoint(&self) -> bool {
        matches!(self, Self::Autosave | Self::Restore)
    }
}

/// Display metadata captured with a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Story title at capture time.
    pub title: String,
    /// Why the snapshot exists.
    #[serde(default)]
    pub kind: SnapshotKind,
}

/// Immutable capture of the whole graph.
#[derive(Debug, Clone)]
pub struct Snapshot {
    id: SnapshotId,
    timestamp: DateTime<Utc>,
    graph: StoryGraph,
    meta: SnapshotMeta,
    content_hash: u64,
}

impl Snapshot {
    /// Stable identity.
    pub fn id(&self) -> SnapshotId {
        self.id
    }

    /// Capture time (refreshed when an identical state is appended again).
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The captured graph.
    pub fn graph(&self) -> &StoryGraph {
        &self.graph
    }

    /// Display metadata.
    pub fn meta(&self) -> &SnapshotMeta {
        &self.meta
    }

    /// xxh64 of the canonical graph serialization.
    pub fn content_hash(&self) -> u64 {
        self.content_hash
    }

    /// Number of scenes in the captured graph.
    pub fn scene_count(&self) -> usize {
        self.graph.len()
    }
}

/// Owned form used when reading the persisted log.
#[derive(Deserialize)]
struct SnapshotRecord {
    #[serde(default)]
    id: Option<SnapshotId>,
    timestamp: DateTime<Utc>,
    data: StoryGraph,
    meta: SnapshotMeta,
}

/// Borrowed form used when writing the persisted log.
#[derive(Serialize)]
struct SnapshotRecordRef<'a> {
    id: SnapshotId,
    timestamp: &'a DateTime<Utc>,
    data: &'a StoryGraph,
    meta: &'a SnapshotMeta,
}

/// Bounded, ordered (oldest → newest) snapshot log backed by durable storage.
#[derive(Debug)]
pub struct SnapshotLog<S: Storage> {
    storage: S,
    keys: StorageKeys,
    max_len: usize,
    entries: VecDeque<Snapshot>,
    next_id: u64,
    last_saved: Option<DateTime<Utc>>,
}

impl<S: Storage> SnapshotLog<S> {
    /// Open the log, loading whatever the storage holds.
    ///
    /// Unreadable or corrupt payloads degrade to an empty log.
    pub fn open(storage: S, config: &KernelConfig) -> Self {
        let mut log = Self {
            storage,
            keys: config.keys.clone(),
            max_len: config.max_snapshots.max(1),
            entries: VecDeque::new(),
            next_id: 0,
            last_saved: None,
        };

        match log.load() {
            Ok(records) => {
                let mut renumber = false;
                for record in records {
                    let id = match record.id {
                        Some(id) if id.0 >= log.next_id => id,
                        _ => SnapshotId(log.next_id),
                    };
                    if id.0 >= MAX_STORED_ID {
                        renumber = true;
                    }
                    log.next_id = id.0.saturating_add(1);
                    let mut graph = record.data;
                    graph.set_bounds(config.canvas);
                    graph.normalize();
                    let content_hash = graph_hash(&graph);
                    log.entries.push_back(Snapshot {
                        id,
                        timestamp: record.timestamp,
                        graph,
                        meta: record.meta,
                        content_hash,
                    });
                }
                if renumber {
                    warn!(entries = log.entries.len(), "stored snapshot ids out of range, renumbering");
                    for (i, entry) in log.entries.iter_mut().enumerate() {
                        entry.id = SnapshotId(i as u64);
                    }
                    log.next_id = log.entries.len() as u64;
                    log.persist();
                }
            }
            Err(e) => warn!(error = %e, key = %log.keys.snapshots, "discarding unreadable snapshot log"),
        }

        log.last_saved = match log.storage.get(&log.keys.last_saved) {
            Ok(Some(raw)) => DateTime::parse_from_rfc3339(raw.trim())
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "failed to read last-saved marker");
                None
            }
        };

        if log.entries.len() > log.max_len {
            log.evict();
            log.persist();
        }
        debug!(entries = log.entries.len(), "snapshot log opened");
        log
    }

    fn load(&self) -> Result<Vec<SnapshotRecord>, StorageError> {
        match self.storage.get(&self.keys.snapshots)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Write the log and drop the error after logging it.
    fn persist(&self) {
        if let Err(e) = self.try_persist() {
            warn!(error = %e, entries = self.entries.len(), "failed to persist snapshot log");
        }
    }

    fn try_persist(&self) -> Result<(), StorageError> {
        let records: Vec<SnapshotRecordRef<'_>> = self
            .entries
            .iter()
            .map(|s| SnapshotRecordRef {
                id: s.id,
                timestamp: &s.timestamp,
                data: &s.graph,
                meta: &s.meta,
            })
            .collect();
        let payload = serde_json::to_string(&records)?;
        self.storage.set(&self.keys.snapshots, &payload)?;
        if let Some(saved) = self.last_saved {
            self.storage.set(&self.keys.last_saved, &saved.to_rfc3339())?;
        }
        Ok(())
    }

    fn evict(&mut self) -> usize {
        let mut evicted = 0;
        while self.entries.len() > self.max_len {
            if let Some(old) = self.entries.pop_front() {
                debug!(snapshot = %old.id, "evicted oldest snapshot");
                evicted += 1;
            }
        }
        evicted
    }

    /// Append a graph state stamped with the current time.
    pub fn append(&mut self, graph: &StoryGraph, kind: SnapshotKind) -> SnapshotId {
        self.append_at(graph, kind, Utc::now())
    }

    /// Append a graph state with an explicit timestamp.
    ///
    /// If the newest entry already holds identical content, its timestamp is
    /// refreshed and its id returned; no entry is added. Otherwise a new entry
    /// is added and the oldest entries evicted until the log is within bound.
    pub fn append_at(&mut self, graph: &StoryGraph, kind: SnapshotKind, timestamp: DateTime<Utc>) -> SnapshotId {
        let content_hash = graph_hash(graph);
        self.last_saved = Some(timestamp);

        if let Some(last) = self.entries.back_mut() {
            if last.content_hash == content_hash {
                last.timestamp = timestamp;
                let id = last.id;
                debug!(snapshot = %id, "identical state, refreshed timestamp");
                self.persist();
                return id;
            }
        }

        let id = SnapshotId(self.next_id);
        self.next_id += 1;
        let title = match graph.metadata().title.trim() {
            "" => UNTITLED_STORY.to_string(),
            t => t.to_string(),
        };
        self.entries.push_back(Snapshot {
            id,
            timestamp,
            graph: graph.clone(),
            meta: SnapshotMeta { title, kind },
            content_hash,
        });
        let evicted = self.evict();
        debug!(snapshot = %id, ?kind, evicted, entries = self.entries.len(), "snapshot appended");
        self.persist();
        id
    }

    /// Entries oldest → newest.
    pub fn list(&self) -> &VecDeque<Snapshot> {
        &self.entries
    }

    /// Iterate entries oldest → newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Snapshot> {
        self.entries.iter()
    }

    /// Look up an entry by id.
    pub fn get(&self, id: SnapshotId) -> Option<&Snapshot> {
        self.entries.iter().find(|s| s.id == id)
    }

    /// Whether an entry with this id is still in the log.
    pub fn contains(&self, id: SnapshotId) -> bool {
        self.get(id).is_some()
    }

    /// Current position of an entry. Positions shift; prefer ids.
    pub fn position(&self, id: SnapshotId) -> Option<usize> {
        self.entries.iter().position(|s| s.id == id)
    }

    /// Newest entry.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.entries.back()
    }

    /// Delete an entry by id.
    pub fn delete(&mut self, id: SnapshotId) -> Option<Snapshot> {
        let index = self.position(id)?;
        self.delete_at(index)
    }

    /// Delete the entry at a position.
    pub fn delete_at(&mut self, index: usize) -> Option<Snapshot> {
        let removed = self.entries.remove(index)?;
        debug!(snapshot = %removed.id, "snapshot deleted");
        self.persist();
        Some(removed)
    }

    /// Remove every entry and the last-saved marker.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_saved = None;
        self.persist();
        if let Err(e) = self.storage.remove(&self.keys.last_saved) {
            warn!(error = %e, "failed to remove last-saved marker");
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Time of the last commit.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }
}
