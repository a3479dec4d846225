//! Session registry: which node owns which session.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use webgrid_protocols::{Node, NodeId, RegistryError, Session, SessionId};

use super::node::Reservation;

/// A session together with the handle of the node that owns it and the slot
/// it occupies there.
#[derive(Clone)]
pub struct SessionBinding {
    pub session: Session,
    pub node: Arc<dyn Node>,
    pub reservation: Reservation,
}

/// Thread-safe map from session id to owning node.
///
/// A binding is inserted whole, so a concurrent lookup observes either
/// nothing or the complete binding.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionBinding>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Bind a session to its node. A session id maps to one node for its
    /// entire lifetime, so rebinding an existing id fails.
    pub fn bind(&self, session: Session, reservation: Reservation) -> Result<(), RegistryError> {
        match self.sessions.entry(session.session_id.clone()) {
            Entry::Occupied(entry) => Err(RegistryError::DuplicateSession(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(SessionBinding {
                    session,
                    node: reservation.node().clone(),
                    reservation,
                });
                Ok(())
            }
        }
    }

    pub fn lookup(&self, id: &SessionId) -> Result<SessionBinding, RegistryError> {
        self.sessions
            .get(id)
            .map(|binding| binding.clone())
            .ok_or_else(|| RegistryError::SessionNotFound(id.clone()))
    }

    pub fn unbind(&self, id: &SessionId) -> Result<SessionBinding, RegistryError> {
        self.sessions
            .remove(id)
            .map(|(_, binding)| binding)
            .ok_or_else(|| RegistryError::SessionNotFound(id.clone()))
    }

    /// Drop every binding owned by `node`, returning the orphaned ids.
    pub fn unbind_node(&self, node: NodeId) -> Vec<SessionId> {
        let orphaned: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|binding| binding.session.node_id == node)
            .map(|binding| binding.key().clone())
            .collect();
        orphaned
            .into_iter()
            .filter(|id| {
                self.sessions
                    .remove_if(id, |_, binding| binding.session.node_id == node)
                    .is_some()
            })
            .collect()
    }

    /// Number of sessions owned by `node`.
    pub fn count_for(&self, node: NodeId) -> usize {
        self.sessions
            .iter()
            .filter(|binding| binding.session.node_id == node)
            .count()
    }

    pub fn list(&self) -> Vec<Session> {
        self.sessions
            .iter()
            .map(|binding| binding.session.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
