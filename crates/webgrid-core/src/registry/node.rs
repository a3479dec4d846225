//! Node registry.
//!
//! Owns every registered node together with its live load counter and
//! lifecycle state.
//!
//! Each node carries its own slot lock guarding `load` and `state`, so
//! reservations on unrelated nodes never contend. The membership map has its
//! own lock. Lock order is map first, slot second.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use webgrid_protocols::{Capabilities, Node, NodeId, NodeState, NodeStatus, RegistryError};

use crate::matcher;

struct Slot {
    load: usize,
    state: NodeState,
}

struct NodeEntry {
    node: Arc<dyn Node>,
    capacity: usize,
    /// Registration order, used to break ties between equally loaded nodes.
    seq: u64,
    slot: Mutex<Slot>,
}

impl NodeEntry {
    fn status(&self) -> NodeStatus {
        let slot = self.slot.lock();
        NodeStatus {
            id: self.node.id(),
            uri: self.node.uri().clone(),
            state: slot.state,
            load: slot.load,
            capacity: self.capacity,
            stereotypes: self.node.stereotypes().to_vec(),
        }
    }
}

/// A node eligible for a new session, with the load observed when listed.
#[derive(Clone)]
pub struct Candidate {
    entry: Arc<NodeEntry>,
    load: usize,
}

impl Candidate {
    pub fn node(&self) -> &Arc<dyn Node> {
        &self.entry.node
    }

    pub fn id(&self) -> NodeId {
        self.entry.node.id()
    }

    pub fn load(&self) -> usize {
        self.load
    }

    /// Take one slot on the registration this candidate was listed from.
    pub fn reserve(&self) -> Result<Reservation, RegistryError> {
        reserve_entry(&self.entry)
    }
}

/// One slot taken on a specific node registration.
///
/// Releasing and liveness checks act on the registration the slot was taken
/// on, so a node re-added under the same id after a forced removal is never
/// affected by slots taken on its predecessor. Release each reservation once.
#[derive(Clone)]
pub struct Reservation {
    entry: Arc<NodeEntry>,
    load: usize,
}

impl Reservation {
    pub fn node(&self) -> &Arc<dyn Node> {
        &self.entry.node
    }

    pub fn node_id(&self) -> NodeId {
        self.entry.node.id()
    }

    /// Node load right after this slot was taken.
    pub fn load(&self) -> usize {
        self.load
    }

    /// The registration is Active or Draining.
    pub fn is_live(&self) -> bool {
        matches!(
            self.entry.slot.lock().state,
            NodeState::Active | NodeState::Draining
        )
    }
}

impl std::fmt::Debug for Reservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation")
            .field("node", &self.node_id())
            .field("load", &self.load)
            .finish()
    }
}

fn reserve_entry(entry: &Arc<NodeEntry>) -> Result<Reservation, RegistryError> {
    let id = entry.node.id();
    let mut slot = entry.slot.lock();
    if slot.state != NodeState::Active {
        return Err(RegistryError::NodeNotActive {
            node: id,
            state: slot.state,
        });
    }
    if slot.load >= entry.capacity {
        return Err(RegistryError::CapacityExceeded {
            node: id,
            capacity: entry.capacity,
        });
    }
    slot.load += 1;
    Ok(Reservation {
        entry: entry.clone(),
        load: slot.load,
    })
}

/// Registry of worker nodes.
pub struct NodeRegistry {
    nodes: RwLock<HashMap<NodeId, Arc<NodeEntry>>>,
    next_seq: AtomicU64,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Register a new Active node.
    pub fn add(&self, node: Arc<dyn Node>) -> Result<(), RegistryError> {
        let id = node.id();
        let capacity = node.max_sessions();
        debug_assert!(capacity > 0, "node capacity must be positive");

        let mut nodes = self.nodes.write();
        if nodes.contains_key(&id) {
            return Err(RegistryError::DuplicateNode(id));
        }

        let entry = NodeEntry {
            node,
            capacity,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            slot: Mutex::new(Slot {
                load: 0,
                state: NodeState::Active,
            }),
        };
        nodes.insert(id, Arc::new(entry));
        info!(node = %id, capacity, "Node registered");
        Ok(())
    }

    /// Take a node out of rotation.
    ///
    /// Without `force` the node drains: no new sessions, existing ones
    /// continue, and the entry is deleted once its load reaches zero. With
    /// `force` it is marked Removed and deleted immediately.
    ///
    /// Never waits for the drain to complete. Removing an unknown (or already
    /// deleted) node is a no-op reporting `Removed`.
    pub fn remove(&self, id: NodeId, force: bool) -> NodeState {
        let Some(entry) = self.entry(id) else {
            debug!(node = %id, "Remove requested for unknown node");
            return NodeState::Removed;
        };

        let state = {
            let mut slot = entry.slot.lock();
            match slot.state {
                NodeState::Removed => return NodeState::Removed,
                NodeState::Draining if !force => return NodeState::Draining,
                _ => {}
            }
            slot.state = if force || slot.load == 0 {
                NodeState::Removed
            } else {
                NodeState::Draining
            };
            slot.state
        };

        match state {
            NodeState::Removed => self.delete(id, &entry),
            _ => info!(node = %id, "Node draining"),
        }
        state
    }

    /// Active nodes satisfying `requested` with spare capacity, least loaded
    /// first.
    ///
    /// The result is a snapshot; calling again restarts the sequence against
    /// current state. A node whose drain began before this call is never
    /// returned.
    pub fn list_eligible(&self, requested: &Capabilities) -> Vec<Candidate> {
        let nodes = self.nodes.read();
        let mut eligible: Vec<(usize, u64, Candidate)> = nodes
            .values()
            .filter(|entry| matcher::matches_any(requested, entry.node.stereotypes()))
            .filter_map(|entry| {
                let slot = entry.slot.lock();
                (slot.state == NodeState::Active && slot.load < entry.capacity).then(|| {
                    let candidate = Candidate {
                        entry: entry.clone(),
                        load: slot.load,
                    };
                    (slot.load, entry.seq, candidate)
                })
            })
            .collect();
        drop(nodes);

        eligible.sort_by_key(|(load, seq, _)| (*load, *seq));
        eligible.into_iter().map(|(_, _, candidate)| candidate).collect()
    }

    /// Whether any registered node (in any state) advertises a stereotype
    /// satisfying `requested`, regardless of capacity.
    pub fn supports(&self, requested: &Capabilities) -> bool {
        self.nodes
            .read()
            .values()
            .any(|entry| matcher::matches_any(requested, entry.node.stereotypes()))
    }

    /// Atomically take one slot on the node currently registered as `id`.
    ///
    /// Fails with `CapacityExceeded` when the node is full and with
    /// `NodeNotActive` once it is draining or removed.
    pub fn reserve(&self, id: NodeId) -> Result<Reservation, RegistryError> {
        let entry = self.entry(id).ok_or(RegistryError::NodeNotFound(id))?;
        reserve_entry(&entry)
    }

    /// Atomically give back a slot on the registration it was taken on.
    /// Returns the remaining load of that registration.
    ///
    /// A draining node whose load drops to zero transitions to Removed under
    /// the same lock and is then deleted from the registry.
    pub fn release(&self, reservation: &Reservation) -> usize {
        let entry = &reservation.entry;
        let id = entry.node.id();
        let (load, finalize) = {
            let mut slot = entry.slot.lock();
            if slot.load == 0 {
                warn!(node = %id, "Release without matching reservation");
            }
            slot.load = slot.load.saturating_sub(1);
            let finalize = slot.state == NodeState::Draining && slot.load == 0;
            if finalize {
                slot.state = NodeState::Removed;
            }
            (slot.load, finalize)
        };

        if finalize {
            self.delete(id, entry);
        }
        load
    }

    pub fn get(&self, id: NodeId) -> Option<Arc<dyn Node>> {
        self.entry(id).map(|entry| entry.node.clone())
    }

    pub fn state(&self, id: NodeId) -> Option<NodeState> {
        self.entry(id).map(|entry| entry.slot.lock().state)
    }

    pub fn load(&self, id: NodeId) -> Option<usize> {
        self.entry(id).map(|entry| entry.slot.lock().load)
    }

    /// Registered and not Removed.
    pub fn is_live(&self, id: NodeId) -> bool {
        matches!(
            self.state(id),
            Some(NodeState::Active) | Some(NodeState::Draining)
        )
    }

    /// Status of every registered node in registration order.
    pub fn status(&self) -> Vec<NodeStatus> {
        let mut entries: Vec<Arc<NodeEntry>> = self.nodes.read().values().cloned().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries.iter().map(|entry| entry.status()).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    fn entry(&self, id: NodeId) -> Option<Arc<NodeEntry>> {
        self.nodes.read().get(&id).cloned()
    }

    /// Delete a Removed entry, unless it was already replaced.
    fn delete(&self, id: NodeId, entry: &Arc<NodeEntry>) {
        let mut nodes = self.nodes.write();
        if nodes.get(&id).is_some_and(|current| Arc::ptr_eq(current, entry)) {
            nodes.remove(&id);
            info!(node = %id, "Node removed");
        }
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
