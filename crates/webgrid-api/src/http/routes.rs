//! Rule table and the axum adapter feeding it.
//!
//! ```text
//! POST   /session                            - New session
//! DELETE /session/{sessionId}                - End session
//! *      /session/{sessionId}/...            - Forward command to the owning node
//! POST   /se/grid/distributor/node           - Add node
//! DELETE /se/grid/distributor/node/{nodeId}  - Drain node (?force=true removes now)
//! GET    /se/grid/session/{sessionId}        - Session details
//! DELETE /se/grid/session/{sessionId}        - Node reports session ended
//! GET    /status                             - Grid status
//! ```

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use http::header;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use webgrid_protocols::{GridRequest, GridResponse};

use crate::dispatch::{CommandHandler, CompoundHandler, PathParams, Route};
use crate::error::DispatchError;
use crate::http::admin::{AddNode, RemoveNode, SessionEnded, SessionInfo};
use crate::http::monitoring::Status;
use crate::http::session::{EndSession, ForwardCommand, NewSession};
use crate::state::AppState;

/// Build the grid's rule table. Order matters: `DELETE /session/{id}` must
/// precede the forwarding rule.
pub fn build_dispatcher(state: Arc<AppState>) -> CompoundHandler {
    CompoundHandler::new()
        .with(Route::post("/session"), NewSession::new(state.clone()))
        .with(Route::delete("/session/{sessionId}"), EndSession::new(state.clone()))
        .with(Route::any("/session/{sessionId}/*"), ForwardCommand::new(state.clone()))
        .with(Route::post("/se/grid/distributor/node"), AddNode::new(state.clone()))
        .with(
            Route::delete("/se/grid/distributor/node/{nodeId}"),
            RemoveNode::new(state.clone()),
        )
        .with(Route::get("/se/grid/session/{sessionId}"), SessionInfo::new(state.clone()))
        .with(Route::delete("/se/grid/session/{sessionId}"), SessionEnded::new(state.clone()))
        .with(Route::get("/status"), Status::new(state))
}

struct Gateway {
    dispatcher: CompoundHandler,
    max_body_bytes: usize,
}

/// Create the axum router. Every request goes through the rule table.
pub fn create_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    let gateway = Arc::new(Gateway {
        dispatcher: build_dispatcher(state),
        max_body_bytes,
    });

    Router::new()
        .fallback(dispatch)
        .with_state(gateway)
        .layer(TraceLayer::new_for_http())
}

async fn dispatch(State(gateway): State<Arc<Gateway>>, request: Request) -> Response {
    let grid_request = match into_grid_request(request, gateway.max_body_bytes).await {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };
    let method = grid_request.method().clone();
    let path = grid_request.path().to_string();

    match gateway.dispatcher.execute(grid_request, PathParams::new()).await {
        Ok(response) => into_response(response),
        Err(err) => {
            let (status, _) = err.status_and_code();
            if status.is_server_error() {
                warn!(%method, %path, status = status.as_u16(), "Request failed: {}", err);
            } else {
                debug!(%method, %path, status = status.as_u16(), "Request rejected: {}", err);
            }
            err.into_response()
        }
    }
}

async fn into_grid_request(request: Request, max_body_bytes: usize) -> Result<GridRequest, DispatchError> {
    let (parts, body) = request.into_parts();

    let declared = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if declared.is_some_and(|length| length > max_body_bytes) {
        return Err(DispatchError::PayloadTooLarge(max_body_bytes));
    }
    let body = to_bytes(body, max_body_bytes)
        .await
        .map_err(|e| DispatchError::InvalidArgument(format!("unreadable request body: {}", e)))?;

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Ok(GridRequest::new(parts.method, path_and_query)
        .with_headers(parts.headers)
        .with_body(body))
}

fn into_response(response: GridResponse) -> Response {
    let (status, headers, body) = response.into_parts();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
