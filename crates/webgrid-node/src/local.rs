//! In-process node.
//!
//! A [`LocalNode`] owns a set of slots, each pairing an advertised stereotype
//! with the [`SessionRunner`] able to start browsers of that kind. Sessions
//! remember which runner created them so later commands reach the same
//! browser.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info};
use url::Url;

use webgrid_core::matcher;
use webgrid_protocols::{
    Capabilities, CreatedSession, GridRequest, GridResponse, Node, NodeError, NodeId, SessionId,
};

/// Sessions per available CPU when no explicit capacity is configured.
const SESSIONS_PER_CPU: usize = 3;

/// Default node capacity: three sessions per available CPU.
pub fn default_max_sessions() -> usize {
    std::thread::available_parallelism()
        .map(|cpus| cpus.get())
        .unwrap_or(1)
        * SESSIONS_PER_CPU
}

/// Something able to run browser sessions on this machine.
#[async_trait]
pub trait SessionRunner: Send + Sync {
    async fn start(&self, capabilities: &Capabilities) -> Result<CreatedSession, NodeError>;

    async fn execute(&self, session: &SessionId, request: GridRequest) -> Result<GridResponse, NodeError>;

    async fn stop(&self, session: &SessionId) -> Result<(), NodeError>;
}

/// Node running sessions through local runners.
pub struct LocalNode {
    id: NodeId,
    uri: Url,
    stereotypes: Vec<Capabilities>,
    runners: Vec<Arc<dyn SessionRunner>>,
    max_sessions: usize,
    sessions: DashMap<SessionId, Arc<dyn SessionRunner>>,
}

impl std::fmt::Debug for LocalNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalNode")
            .field("id", &self.id)
            .field("uri", &self.uri.as_str())
            .field("max_sessions", &self.max_sessions)
            .finish()
    }
}

impl LocalNode {
    pub fn new(uri: Url, max_sessions: usize) -> Self {
        Self {
            id: NodeId::random(),
            uri,
            stereotypes: Vec::new(),
            runners: Vec::new(),
            max_sessions: max_sessions.max(1),
            sessions: DashMap::new(),
        }
    }

    /// Advertise `stereotype`, served by `runner`.
    pub fn with_slot(mut self, stereotype: Capabilities, runner: Arc<dyn SessionRunner>) -> Self {
        self.stereotypes.push(stereotype);
        self.runners.push(runner);
        self
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn runner_for(&self, requested: &Capabilities) -> Option<&Arc<dyn SessionRunner>> {
        self.stereotypes
            .iter()
            .position(|stereotype| matcher::matches(requested, stereotype))
            .map(|index| &self.runners[index])
    }

    fn runner_of(&self, session: &SessionId) -> Result<Arc<dyn SessionRunner>, NodeError> {
        self.sessions
            .get(session)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| NodeError::UnknownSession(session.clone()))
    }
}

#[async_trait]
impl Node for LocalNode {
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
        let runner = self.runner_for(capabilities).cloned().ok_or_else(|| NodeError::Rejected {
            status: 500,
            message: "no local slot matches the requested capabilities".to_string(),
        })?;

        let created = runner.start(capabilities).await?;
        self.sessions.insert(created.id.clone(), runner);
        info!(session = %created.id, "Local session started");
        Ok(created)
    }

    async fn execute(&self, request: GridRequest) -> Result<GridResponse, NodeError> {
        let session = request
            .session_id()
            .ok_or_else(|| NodeError::Custom(format!("not a session command: {}", request.path())))?;
        let runner = self.runner_of(&session)?;
        runner.execute(&session, request).await
    }

    async fn stop_session(&self, session_id: &SessionId) -> Result<(), NodeError> {
        let (_, runner) = self
            .sessions
            .remove(session_id)
            .ok_or_else(|| NodeError::UnknownSession(session_id.clone()))?;
        debug!(session = %session_id, "Stopping local session");
        runner.stop(session_id).await
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
