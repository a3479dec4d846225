//! Scheduling errors surfaced by the distributor.

use thiserror::Error;

use super::registry::RegistryError;
use crate::types::{NodeId, SessionId};

#[derive(Debug, Error)]
pub enum DistributorError {
    #[error("Node already registered: {0}")]
    DuplicateNode(NodeId),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("No node supports the requested capabilities")]
    NoMatchingNode,

    /// Every eligible candidate rejected or failed; carries the last cause.
    #[error("Unable to create session: {0}")]
    SessionNotCreated(String),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),
}

impl From<RegistryError> for DistributorError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateNode(id) => Self::DuplicateNode(id),
            RegistryError::NodeNotFound(id) => Self::NodeNotFound(id),
            RegistryError::SessionNotFound(id) => Self::SessionNotFound(id),
            other => Self::SessionNotCreated(other.to_string()),
        }
    }
}
