//! Handle to a node process reachable over HTTP.

use async_trait::async_trait;
use url::Url;

use webgrid_protocols::{
    Capabilities, CreatedSession, GridRequest, GridResponse, Node, NodeError, NodeId, SessionId,
};

use crate::client::WebDriverClient;

/// A registered node speaking WebDriver at its base URI.
pub struct RemoteNode {
    id: NodeId,
    uri: Url,
    stereotypes: Vec<Capabilities>,
    max_sessions: usize,
    client: WebDriverClient,
}

impl RemoteNode {
    /// `max_sessions` is clamped to at least one.
    pub fn new(id: NodeId, uri: Url, stereotypes: Vec<Capabilities>, max_sessions: usize) -> Self {
        let client = WebDriverClient::new(uri.clone());
        Self {
            id,
            uri,
            stereotypes,
            max_sessions: max_sessions.max(1),
            client,
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies, TLS).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.client = WebDriverClient::with_client(self.uri.clone(), http);
        self
    }
}

impl std::fmt::Debug for RemoteNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteNode")
            .field("id", &self.id)
            .field("uri", &self.uri.as_str())
            .field("max_sessions", &self.max_sessions)
            .finish()
    }
}

#[async_trait]
impl Node for RemoteNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn uri(&self) -> &Url {
        &self.uri
    }

    fn stereotypes(&self) -> &[Capabilities] {
        &self.stereotypes
    }

    fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    async fn new_session(&self, capabilities: &Capabilities) -> Result<CreatedSession, NodeError> {
        self.client.create_session(capabilities).await
    }

    async fn execute(&self, request: GridRequest) -> Result<GridResponse, NodeError> {
        self.client.forward(request).await
    }

    async fn stop_session(&self, session_id: &SessionId) -> Result<(), NodeError> {
        self.client.delete_session(session_id).await
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
