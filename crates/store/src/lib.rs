//! Label graph store: key-indexed labels partitioned by group, plus the reconciler
//! that merges an edited batch into it.
//!
//! The store is owned by the caller (one per session) and passed in explicitly.
//! Several widgets may share one store; each only rewrites its own group.

#![forbid(unsafe_code)]

use labelgraph_core::{EditedBatch, Group, Label};
use metrics::{counter, histogram};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Whether absence from a full `labels` list implies deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrunePolicy {
    /// Only keys listed in `deleted` are removed.
    #[default]
    DeletedOnly,
    /// Also drop the group's labels missing from `labels`.
    PruneAbsent,
}

/// A stored label and the group that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub group: Group,
    #[serde(flatten)]
    pub label: Label,
}

/// Outcome of one reconciliation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    /// The group's labels, in batch order.
    pub labels: Vec<Label>,
    pub upserted: usize,
    /// Batch labels whose key already belongs to another group.
    pub foreign: usize,
    pub deleted: usize,
    pub pruned: usize,
}

/// Key → label map, partitioned by group, remembering insertion order.
///
/// Serializes as an ordered list of entries so persisted snapshots are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Entry>", into = "Vec<Entry>")]
pub struct LabelStore {
    map: FxHashMap<String, Entry>,
    order: Vec<String>,
}

impl From<Vec<Entry>> for LabelStore {
    fn from(entries: Vec<Entry>) -> Self {
        let mut store = LabelStore::new();
        for e in entries {
            store.put(e.group, e.label);
        }
        store
    }
}

impl From<LabelStore> for Vec<Entry> {
    fn from(mut store: LabelStore) -> Self {
        store.order.iter().filter_map(|k| store.map.remove(k)).collect()
    }
}

impl LabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.map.get(key)
    }

    pub fn group_of(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|e| e.group.as_str())
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.order.iter().filter_map(|k| self.map.get(k))
    }

    /// Distinct groups, in order of first appearance.
    pub fn groups(&self) -> Vec<&str> {
        let mut seen = FxHashSet::default();
        self.entries().map(|e| e.group.as_str()).filter(|g| seen.insert(*g)).collect()
    }

    /// The group's labels in insertion order.
    pub fn get(&self, group: &str) -> Vec<Label> {
        self.entries().filter(|e| e.group == group).map(|e| e.label.clone()).collect()
    }

    /// Insert or overwrite a label under `group` regardless of its current owner.
    /// Used for seeding; edits go through [`LabelStore::reconcile`].
    pub fn put(&mut self, group: impl Into<Group>, label: Label) {
        let key = label.key.clone();
        if !self.map.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.map.insert(key, Entry { group: group.into(), label });
    }

    /// Remove a key from any group. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        if self.map.remove(key).is_none() {
            return false;
        }
        self.order.retain(|k| k != key);
        true
    }

    /// Merge `batch` into `group` treating `deleted` as authoritative.
    pub fn reconcile(&mut self, group: &str, batch: &EditedBatch) -> Vec<Label> {
        self.reconcile_with(group, batch, PrunePolicy::DeletedOnly).labels
    }

    /// Merge `batch` into `group`:
    /// 1. upsert each batch label whose key is unknown or already owned by `group`;
    /// 2. remove every key in `deleted`, whatever its group (unknown keys are ignored);
    /// 3. under [`PrunePolicy::PruneAbsent`], drop the group's keys missing from `labels`.
    ///
    /// Returns the group's surviving labels in batch order. Other groups' entries
    /// are never rewritten by step 1 or 3.
    pub fn reconcile_with(&mut self, group: &str, batch: &EditedBatch, policy: PrunePolicy) -> Reconciled {
        let started = std::time::Instant::now();
        let mut out = Reconciled::default();

        for label in &batch.labels {
            match self.map.get_mut(&label.key) {
                Some(e) if e.group != group => {
                    debug!(key = %label.key, owner = %e.group, group, "skipping label owned by another group");
                    out.foreign += 1;
                }
                Some(e) => {
                    e.label = label.clone();
                    out.upserted += 1;
                }
                None => {
                    self.order.push(label.key.clone());
                    self.map.insert(label.key.clone(), Entry { group: group.to_string(), label: label.clone() });
                    out.upserted += 1;
                }
            }
        }

        for key in &batch.deleted {
            if self.remove(key) {
                out.deleted += 1;
            }
        }

        if policy == PrunePolicy::PruneAbsent {
            let present: FxHashSet<&str> = batch.labels.iter().map(|l| l.key.as_str()).collect();
            let stale: Vec<String> = self
                .entries()
                .filter(|e| e.group == group && !present.contains(e.label.key.as_str()))
                .map(|e| e.label.key.clone())
                .collect();
            for key in stale {
                if self.remove(&key) {
                    out.pruned += 1;
                }
            }
        }

        let mut seen = FxHashSet::default();
        out.labels = batch
            .labels
            .iter()
            .filter(|l| seen.insert(l.key.as_str()))
            .filter_map(|l| self.map.get(&l.key))
            .filter(|e| e.group == group)
            .map(|e| e.label.clone())
            .collect();

        debug!(
            group,
            upserted = out.upserted,
            foreign = out.foreign,
            deleted = out.deleted,
            pruned = out.pruned,
            total = self.len(),
            "reconciled label batch"
        );
        counter!("labels_upserted_total", out.upserted as u64);
        counter!("labels_deleted_total", (out.deleted + out.pruned) as u64);
        histogram!("reconcile_ms", started.elapsed().as_secs_f64() * 1000.0);
        out
    }
}
