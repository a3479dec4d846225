//! Node transport errors.

use thiserror::Error;

use crate::types::SessionId;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Node unreachable: {0}")]
    Unreachable(String),

    #[error("Node request timed out")]
    Timeout,

    #[error("Node rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response from node: {0}")]
    InvalidResponse(String),

    #[error("Unknown session on node: {0}")]
    UnknownSession(SessionId),

    #[error("{0}")]
    Custom(String),
}

impl NodeError {
    /// Whether the failure happened below HTTP (connection or timeout).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout)
    }
}
