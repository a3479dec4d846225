//! Node handle protocol.
//!
//! A [`Node`] is the coordinator's view of a worker able to run a bounded
//! number of browser sessions. Implementations may run sessions in-process or
//! talk to a remote machine; callers only depend on this trait.

use async_trait::async_trait;
use url::Url;

use crate::error::NodeError;
use crate::types::{Capabilities, GridRequest, GridResponse, NodeId, SessionId};

/// Result of a successful node-side session creation.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedSession {
    pub id: SessionId,
    /// Capabilities actually granted, which may differ from those requested.
    pub capabilities: Capabilities,
}

/// Client-side handle to a worker node.
#[async_trait]
pub trait Node: Send + Sync {
    /// Unique identity of the node.
    fn id(&self) -> NodeId;

    /// Base network address.
    fn uri(&self) -> &Url;

    /// Advertised capability profiles.
    fn stereotypes(&self) -> &[Capabilities];

    /// Maximum number of concurrent sessions. Always positive.
    fn max_sessions(&self) -> usize;

    /// Start a browser session matching `capabilities`.
    async fn new_session(&self, capabilities: &Capabilities) -> Result<CreatedSession, NodeError>;

    /// Forward a command for an existing session, returning the node's raw
    /// response.
    async fn execute(&self, request: GridRequest) -> Result<GridResponse, NodeError>;

    /// Terminate a session.
    async fn stop_session(&self, session_id: &SessionId) -> Result<(), NodeError>;
}
