//! Node and session registry errors.

use thiserror::Error;

use crate::types::{NodeId, NodeState, SessionId};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Node already registered: {0}")]
    DuplicateNode(NodeId),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Internal signal: the node is full, try another candidate.
    #[error("Node {node} is at capacity ({capacity})")]
    CapacityExceeded { node: NodeId, capacity: usize },

    #[error("Node {node} is {state}, not accepting sessions")]
    NodeNotActive { node: NodeId, state: NodeState },

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Session already bound: {0}")]
    DuplicateSession(SessionId),
}
