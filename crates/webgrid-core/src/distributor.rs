//! Session distributor.
//!
//! Places new-session requests on nodes: finds eligible candidates, reserves
//! capacity, asks the node to create the session and records the binding.
//! Also owns session termination and node membership changes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use webgrid_protocols::{
    Capabilities, CapabilityRequest, DistributorError, GridStatus, Node, NodeError, NodeId,
    NodeState, Session, SessionId,
};

use crate::registry::{Candidate, NodeRegistry, SessionRegistry};

/// Distributor settings.
#[derive(Debug, Clone)]
pub struct DistributorConfig {
    /// Upper bound for a node to create a session.
    pub session_timeout: Duration,
    /// Upper bound for a node to terminate a session.
    pub stop_timeout: Duration,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_secs(300),
            stop_timeout: Duration::from_secs(60),
        }
    }
}

/// Scheduler matching session requests to nodes.
pub struct Distributor {
    nodes: Arc<NodeRegistry>,
    sessions: Arc<SessionRegistry>,
    config: DistributorConfig,
}

impl Distributor {
    pub fn new(
        nodes: Arc<NodeRegistry>,
        sessions: Arc<SessionRegistry>,
        config: DistributorConfig,
    ) -> Self {
        Self {
            nodes,
            sessions,
            config,
        }
    }

    pub fn nodes(&self) -> &Arc<NodeRegistry> {
        &self.nodes
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Create a session on the least loaded node able to satisfy `request`.
    ///
    /// Alternatives are tried in order. Node-side failures release the
    /// reservation and move on to the next candidate.
    pub async fn new_session(&self, request: &CapabilityRequest) -> Result<Session, DistributorError> {
        let mut supported = false;
        let mut last_cause = None;

        for capabilities in request.alternatives() {
            if !self.nodes.supports(capabilities) {
                continue;
            }
            supported = true;

            for candidate in self.nodes.list_eligible(capabilities) {
                match self.try_candidate(&candidate, capabilities).await {
                    Ok(session) => return Ok(session),
                    Err(cause) => last_cause = Some(cause),
                }
            }
        }

        if !supported {
            debug!("No registered node supports the requested capabilities");
            return Err(DistributorError::NoMatchingNode);
        }
        Err(DistributorError::SessionNotCreated(last_cause.unwrap_or_else(|| {
            "no matching node has a free slot".to_string()
        })))
    }

    async fn try_candidate(
        &self,
        candidate: &Candidate,
        capabilities: &Capabilities,
    ) -> Result<Session, String> {
        let node_id = candidate.id();
        let reservation = match candidate.reserve() {
            Ok(reservation) => reservation,
            Err(err) => {
                debug!(node = %node_id, "Skipping candidate: {}", err);
                return Err(err.to_string());
            }
        };

        let node = reservation.node().clone();
        let created = match tokio::time::timeout(
            self.config.session_timeout,
            node.new_session(capabilities),
        )
        .await
        {
            Ok(Ok(created)) => created,
            Ok(Err(err)) => {
                warn!(node = %node_id, "Session creation failed: {}", err);
                self.nodes.release(&reservation);
                return Err(err.to_string());
            }
            Err(_) => {
                warn!(node = %node_id, "Session creation timed out");
                self.nodes.release(&reservation);
                return Err(NodeError::Timeout.to_string());
            }
        };

        let session = Session {
            session_id: created.id,
            node_id,
            uri: node.uri().clone(),
            capabilities: created.capabilities,
            start_time: Utc::now(),
        };
        if let Err(err) = self.sessions.bind(session.clone(), reservation.clone()) {
            warn!(node = %node_id, "Cannot bind new session: {}", err);
            self.stop_quietly(node.as_ref(), &session.session_id).await;
            self.nodes.release(&reservation);
            return Err(err.to_string());
        }

        // A forced removal may have raced with creation; the registration is
        // gone, so the session cannot be served.
        if !reservation.is_live() {
            if let Ok(binding) = self.sessions.unbind(&session.session_id) {
                self.nodes.release(&binding.reservation);
            }
            self.stop_quietly(node.as_ref(), &session.session_id).await;
            return Err(format!("node {} was removed during session creation", node_id));
        }

        info!(session = %session.session_id, node = %node_id, "Session created");
        Ok(session)
    }

    /// Terminate a session on its node and forget it.
    ///
    /// The binding is dropped and the slot released whatever the node
    /// answers, so the grid's view of load never leaks.
    pub async fn end_session(&self, id: &SessionId) -> Result<(), DistributorError> {
        let binding = self.sessions.lookup(id)?;
        self.stop_quietly(binding.node.as_ref(), id).await;
        self.forget(id)
    }

    /// The owning node reported that a session ended on its own.
    pub fn session_ended(&self, id: &SessionId) -> Result<(), DistributorError> {
        self.forget(id)
    }

    fn forget(&self, id: &SessionId) -> Result<(), DistributorError> {
        let binding = self.sessions.unbind(id)?;
        self.nodes.release(&binding.reservation);
        info!(session = %id, node = %binding.session.node_id, "Session ended");
        Ok(())
    }

    pub fn add(&self, node: Arc<dyn Node>) -> Result<(), DistributorError> {
        self.nodes.add(node)?;
        Ok(())
    }

    /// Take a node out of rotation. Returns immediately after the state
    /// change; see [`NodeRegistry::remove`].
    ///
    /// A forced removal also drops the bindings of the node's sessions, so
    /// later commands for them are rejected as unknown sessions.
    pub fn remove(&self, id: NodeId, force: bool) -> NodeState {
        let state = self.nodes.remove(id, force);
        if force {
            for session in self.sessions.unbind_node(id) {
                warn!(session = %session, node = %id, "Session orphaned by forced node removal");
            }
        }
        state
    }

    pub fn status(&self) -> GridStatus {
        GridStatus::from_nodes(self.nodes.status())
    }

    async fn stop_quietly(&self, node: &dyn Node, id: &SessionId) {
        match tokio::time::timeout(self.config.stop_timeout, node.stop_session(id)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(session = %id, "Node failed to stop session: {}", err),
            Err(_) => warn!(session = %id, "Node timed out stopping session"),
        }
    }
}

#[cfg(test)]
#[path = "distributor_tests.rs"]
mod tests;
