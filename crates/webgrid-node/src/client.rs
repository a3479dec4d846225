//! HTTP client for a single WebDriver endpoint.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, StatusCode, header};
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use webgrid_protocols::{Capabilities, CreatedSession, GridRequest, GridResponse, NodeError, SessionId};

/// Connection-scoped headers that must not cross a proxy hop.
const HOP_BY_HOP: [HeaderName; 6] = [
    header::CONNECTION,
    header::CONTENT_LENGTH,
    header::HOST,
    header::TE,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Talks W3C WebDriver to one base URL: creates sessions, relays commands
/// and deletes sessions.
#[derive(Debug, Clone)]
pub struct WebDriverClient {
    base: Url,
    http: reqwest::Client,
}

impl WebDriverClient {
    pub fn new(base: Url) -> Self {
        Self::with_client(base, reqwest::Client::new())
    }

    pub fn with_client(base: Url, http: reqwest::Client) -> Self {
        Self { base, http }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for `path_and_query`, keeping any path prefix of the base.
    pub fn endpoint(&self, path_and_query: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path_and_query.trim_start_matches('/')
        )
    }

    /// `POST /session` with `capabilities` as the `alwaysMatch` set.
    pub async fn create_session(&self, capabilities: &Capabilities) -> Result<CreatedSession, NodeError> {
        let payload = json!({ "capabilities": { "alwaysMatch": capabilities } });
        let response = self
            .http
            .post(self.endpoint("/session"))
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(NodeError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        parse_new_session(&body, capabilities)
    }

    /// Relay a command verbatim and hand back the raw answer.
    pub async fn forward(&self, request: GridRequest) -> Result<GridResponse, NodeError> {
        let url = self.endpoint(&request.path_and_query());
        debug!(method = %request.method(), url = %url, "Forwarding command");

        let response = self
            .http
            .request(request.method().clone(), url)
            .headers(strip_hop_by_hop(request.headers()))
            .body(request.body().clone())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let headers = strip_hop_by_hop(response.headers());
        let body = response.bytes().await.map_err(transport_error)?;
        Ok(GridResponse::new(status).with_headers(headers).with_body(body))
    }

    /// `DELETE /session/{id}`.
    pub async fn delete_session(&self, id: &SessionId) -> Result<(), NodeError> {
        let response = self
            .http
            .delete(self.endpoint(&format!("/session/{}", id)))
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(NodeError::UnknownSession(id.clone())),
            status => {
                let body = response.bytes().await.unwrap_or_default();
                Err(NodeError::Rejected {
                    status: status.as_u16(),
                    message: error_message(&body),
                })
            }
        }
    }
}

pub(crate) fn transport_error(err: reqwest::Error) -> NodeError {
    if err.is_timeout() {
        NodeError::Timeout
    } else if err.is_decode() || err.is_body() {
        NodeError::InvalidResponse(err.to_string())
    } else {
        NodeError::Unreachable(err.to_string())
    }
}

fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
    headers
}

/// Extract the session from a W3C answer (`{"value": {"sessionId", "capabilities"}}`)
/// or a legacy one carrying `sessionId` at the top level.
fn parse_new_session(body: &Bytes, requested: &Capabilities) -> Result<CreatedSession, NodeError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| NodeError::InvalidResponse(e.to_string()))?;

    let value = payload.get("value");
    let (session_id, granted) = match value.and_then(|value| value.get("sessionId")) {
        Some(id) => (Some(id), value.and_then(|value| value.get("capabilities"))),
        None => (payload.get("sessionId"), value),
    };

    let session_id = session_id
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| NodeError::InvalidResponse("missing sessionId".to_string()))?;
    let granted = granted
        .and_then(|caps| serde_json::from_value::<Capabilities>(caps.clone()).ok())
        .unwrap_or_else(|| requested.clone());

    Ok(CreatedSession {
        id: SessionId::new(session_id),
        capabilities: granted,
    })
}

/// Best-effort human readable message from a W3C error body.
fn error_message(body: &Bytes) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|payload| {
            payload
                .pointer("/value/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
