//! Grid administration: node membership and node-side session reports.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use url::Url;

use webgrid_node::RemoteNode;
use webgrid_protocols::codec::encode_value;
use webgrid_protocols::{Capabilities, GridRequest, GridResponse, NodeId};

use crate::dispatch::{CommandHandler, PathParams};
use crate::error::DispatchError;
use crate::http::{param, session_param};
use crate::state::AppState;

/// Body of `POST /se/grid/distributor/node`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddNodePayload {
    id: NodeId,
    uri: Url,
    capabilities: Vec<Capabilities>,
    #[serde(default)]
    max_sessions: Option<usize>,
}

/// `POST /se/grid/distributor/node`
pub struct AddNode {
    state: Arc<AppState>,
}

impl AddNode {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl CommandHandler for AddNode {
    async fn execute(&self, request: GridRequest, _params: PathParams) -> Result<GridResponse, DispatchError> {
        let payload: AddNodePayload = serde_json::from_slice(request.body())
            .map_err(|e| DispatchError::InvalidArgument(format!("invalid node payload: {}", e)))?;

        if !matches!(payload.uri.scheme(), "http" | "https") {
            return Err(DispatchError::InvalidArgument(format!(
                "node uri must be http or https: {}",
                payload.uri
            )));
        }
        if payload.capabilities.is_empty() {
            return Err(DispatchError::InvalidArgument(
                "node must advertise at least one capability stereotype".to_string(),
            ));
        }
        let capacity = match payload.max_sessions {
            Some(0) => {
                return Err(DispatchError::InvalidArgument(
                    "maxSessions must be positive".to_string(),
                ));
            }
            Some(capacity) => capacity,
            None => self.state.settings.default_node_capacity,
        };

        let node = RemoteNode::new(payload.id, payload.uri.clone(), payload.capabilities, capacity)
            .with_http_client(self.state.node_client.clone());
        self.state.distributor.add(Arc::new(node))?;

        info!(node = %payload.id, uri = %payload.uri, capacity, "Node added");
        Ok(GridResponse::json(
            StatusCode::OK,
            &encode_value(json!({ "nodeId": payload.id, "maxSessions": capacity })),
        ))
    }
}

/// `DELETE /se/grid/distributor/node/{nodeId}[?force=true]`
pub struct RemoveNode {
    state: Arc<AppState>,
}

impl RemoveNode {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl CommandHandler for RemoveNode {
    async fn execute(&self, request: GridRequest, params: PathParams) -> Result<GridResponse, DispatchError> {
        let raw = param(&params, "nodeId")?;
        let id: NodeId = raw
            .parse()
            .map_err(|_| DispatchError::InvalidArgument(format!("not a node id: {}", raw)))?;
        let force = request.query_param("force") == Some("true");

        let state = self.state.distributor.remove(id, force);
        info!(node = %id, force, state = %state, "Node removal requested");
        Ok(GridResponse::json(
            StatusCode::OK,
            &encode_value(json!({ "nodeId": id, "state": state })),
        ))
    }
}

/// `GET /se/grid/session/{sessionId}`
pub struct SessionInfo {
    state: Arc<AppState>,
}

impl SessionInfo {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl CommandHandler for SessionInfo {
    async fn execute(&self, _request: GridRequest, params: PathParams) -> Result<GridResponse, DispatchError> {
        let id = session_param(&params)?;
        let binding = self
            .state
            .sessions()
            .lookup(&id)
            .map_err(|_| DispatchError::SessionNotFound(id))?;
        Ok(GridResponse::json(StatusCode::OK, &encode_value(json!(binding.session))))
    }
}

/// `DELETE /se/grid/session/{sessionId}`: the owning node reports the session
/// is gone.
pub struct SessionEnded {
    state: Arc<AppState>,
}

impl SessionEnded {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl CommandHandler for SessionEnded {
    async fn execute(&self, _request: GridRequest, params: PathParams) -> Result<GridResponse, DispatchError> {
        let id = session_param(&params)?;
        self.state.distributor.session_ended(&id)?;
        Ok(GridResponse::json(StatusCode::OK, &encode_value(serde_json::Value::Null)))
    }
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
