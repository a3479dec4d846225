//! Session endpoints: creation, termination and command forwarding.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use tracing::{debug, warn};

use webgrid_protocols::codec::{self, encode_new_session, encode_value};
use webgrid_protocols::{GridRequest, GridResponse, NodeError};

use crate::dispatch::{CommandHandler, PathParams};
use crate::error::DispatchError;
use crate::http::session_param;
use crate::state::AppState;

/// `POST /session`
pub struct NewSession {
    state: Arc<AppState>,
}

impl NewSession {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl CommandHandler for NewSession {
    async fn execute(&self, request: GridRequest, _params: PathParams) -> Result<GridResponse, DispatchError> {
        let capabilities = codec::decode_new_session(request.body())?;
        let session = self.state.distributor.new_session(&capabilities).await?;
        Ok(GridResponse::json(
            StatusCode::OK,
            &encode_new_session(&session.session_id, &session.capabilities),
        ))
    }
}

/// `DELETE /session/{sessionId}`
pub struct EndSession {
    state: Arc<AppState>,
}

impl EndSession {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl CommandHandler for EndSession {
    async fn execute(&self, _request: GridRequest, params: PathParams) -> Result<GridResponse, DispatchError> {
        let id = session_param(&params)?;
        self.state.distributor.end_session(&id).await?;
        Ok(GridResponse::json(StatusCode::OK, &encode_value(serde_json::Value::Null)))
    }
}

/// `* /session/{sessionId}/...`: relays the command to the owning node.
pub struct ForwardCommand {
    state: Arc<AppState>,
}

impl ForwardCommand {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl CommandHandler for ForwardCommand {
    async fn execute(&self, request: GridRequest, params: PathParams) -> Result<GridResponse, DispatchError> {
        let id = session_param(&params)?;
        let binding = self
            .state
            .sessions()
            .lookup(&id)
            .map_err(|_| DispatchError::SessionNotFound(id.clone()))?;

        let node_id = binding.session.node_id;
        if !binding.reservation.is_live() {
            warn!(session = %id, node = %node_id, "Dropping session of removed node");
            let _ = self.state.distributor.session_ended(&id);
            return Err(DispatchError::SessionNotFound(id));
        }

        debug!(session = %id, node = %node_id, "Forwarding {} {}", request.method(), request.path());
        let timeout = self.state.settings.command_timeout;
        match tokio::time::timeout(timeout, binding.node.execute(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(NodeError::Timeout)) | Err(_) => {
                warn!(session = %id, node = %node_id, "Command timed out after {:?}", timeout);
                Err(DispatchError::UpstreamTimeout)
            }
            Ok(Err(NodeError::UnknownSession(_))) => {
                warn!(session = %id, node = %node_id, "Node no longer knows the session");
                let _ = self.state.distributor.session_ended(&id);
                Err(DispatchError::SessionNotFound(id))
            }
            Ok(Err(err)) => {
                warn!(session = %id, node = %node_id, "Command forwarding failed: {}", err);
                Err(DispatchError::Upstream(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
