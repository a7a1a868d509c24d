//! Membership table: the authoritative node id -> NodeInfo view.
//!
//! Values are `Arc<NodeInfo>` and every write swaps the whole Arc, so a reader
//! never sees a mix of two beacons. Writes lock only the shard owning the key.
//! Snapshots take `snapshot_gate` exclusively while copying Arc pointers; writers
//! hold it shared, so they never contend with each other through it and a
//! snapshot is the state of the table at a single instant.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{NodeId, NodeInfo};

/// What `upsert` replaced
#[derive(Debug, Clone, Default)]
pub struct PriorState {
    pub previous: Option<Arc<NodeInfo>>,
}

impl PriorState {
    /// Was there an entry for this node before the write?
    pub fn existed(&self) -> bool {
        self.previous.is_some()
    }
}

/// Concurrent membership store
#[derive(Debug, Default)]
pub struct MembershipTable {
    nodes: DashMap<NodeId, Arc<NodeInfo>>,
    snapshot_gate: RwLock<()>,
}

impl MembershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `info` as the current value for `node_id`
    pub fn upsert(&self, node_id: NodeId, info: Arc<NodeInfo>) -> PriorState {
        let _gate = self.snapshot_gate.read();
        PriorState {
            previous: self.nodes.insert(node_id, info),
        }
    }

    /// Like `upsert`, but keeps the stored value when it has a newer contact
    /// time than `info`. Returns the kept value as the error.
    pub fn upsert_if_fresher(
        &self,
        node_id: NodeId,
        info: Arc<NodeInfo>,
    ) -> Result<PriorState, Arc<NodeInfo>> {
        let _gate = self.snapshot_gate.read();
        match self.nodes.entry(node_id) {
            Entry::Occupied(mut entry) => {
                if info.last_contact_time() < entry.get().last_contact_time() {
                    return Err(Arc::clone(entry.get()));
                }
                let previous = entry.insert(info);
                Ok(PriorState {
                    previous: Some(previous),
                })
            }
            Entry::Vacant(entry) => {
                entry.insert(info);
                Ok(PriorState::default())
            }
        }
    }

    pub fn get(&self, node_id: NodeId) -> Option<Arc<NodeInfo>> {
        self.nodes.get(&node_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Frozen copy of the whole table
    pub fn snapshot(&self) -> MembershipSnapshot {
        let _gate = self.snapshot_gate.write();
        let nodes = self
            .nodes
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        MembershipSnapshot {
            nodes: Arc::new(nodes),
        }
    }

    pub fn remove(&self, node_id: NodeId) -> Option<Arc<NodeInfo>> {
        let _gate = self.snapshot_gate.read();
        self.nodes.remove(&node_id).map(|(_, info)| info)
    }

    /// Remove every node last contacted before `cutoff` (epoch millis).
    ///
    /// A node refreshed between the scan and its removal is kept.
    pub fn evict_older_than(&self, cutoff: i64) -> Vec<NodeId> {
        let _gate = self.snapshot_gate.read();

        // Shard read locks must be released before remove_if takes write locks
        let candidates: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|entry| entry.value().last_contact_time() < cutoff)
            .map(|entry| *entry.key())
            .collect();

        self.remove_stale(candidates, cutoff)
    }

    /// Remove each candidate whose stored entry is still older than `cutoff`
    fn remove_stale(&self, candidates: Vec<NodeId>, cutoff: i64) -> Vec<NodeId> {
        candidates
            .into_iter()
            .filter(|id| {
                self.nodes
                    .remove_if(id, |_, info| info.last_contact_time() < cutoff)
                    .is_some()
            })
            .collect()
    }
}

/// Immutable view of the table at one instant. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct MembershipSnapshot {
    nodes: Arc<HashMap<NodeId, Arc<NodeInfo>>>,
}

impl MembershipSnapshot {
    pub fn get(&self, node_id: NodeId) -> Option<&Arc<NodeInfo>> {
        self.nodes.get(&node_id)
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Arc<NodeInfo>)> {
        self.nodes.iter()
    }

    /// Node ids in ascending order
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<_> = self.nodes.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Serialize for MembershipSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.nodes.len()))?;
        for (id, info) in self.nodes.iter() {
            map.serialize_entry(id, info.as_ref())?;
        }
        map.end()
    }
}
