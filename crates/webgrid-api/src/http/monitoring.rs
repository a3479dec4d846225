//! Grid status.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use serde_json::json;

use webgrid_protocols::codec::encode_value;
use webgrid_protocols::{GridRequest, GridResponse};

use crate::dispatch::{CommandHandler, PathParams};
use crate::error::DispatchError;
use crate::state::AppState;

/// `GET /status`
pub struct Status {
    state: Arc<AppState>,
}

impl Status {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl CommandHandler for Status {
    async fn execute(&self, _request: GridRequest, _params: PathParams) -> Result<GridResponse, DispatchError> {
        let status = self.state.distributor.status();
        let body = encode_value(json!({
            "ready": status.ready,
            "message": status.message(),
            "uptimeSecs": self.state.uptime().as_secs(),
            "nodes": status.nodes,
        }));
        Ok(GridResponse::json(StatusCode::OK, &body))
    }
}
