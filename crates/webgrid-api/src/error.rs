//! Dispatch errors and their WebDriver-style HTTP rendering.

use axum::response::{IntoResponse, Response};
use http::{HeaderValue, Method, StatusCode, header};
use thiserror::Error;

use webgrid_protocols::codec::encode_error;
use webgrid_protocols::{CodecError, DistributorError, JSON_CONTENT_TYPE, SessionId};

/// Errors surfaced to grid clients.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No rule matched the request.
    #[error("No handler for {method} {path}")]
    NoHandler { method: Method, path: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Unknown session: {0}")]
    SessionNotFound(SessionId),

    #[error(transparent)]
    Distributor(#[from] DistributorError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The owning node could not be reached or answered garbage.
    #[error("Upstream node failure: {0}")]
    Upstream(String),

    #[error("Upstream node timed out")]
    UpstreamTimeout,
}

impl DispatchError {
    /// HTTP status and W3C error code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NoHandler { .. } => (StatusCode::NOT_FOUND, "unknown command"),
            Self::InvalidArgument(_) | Self::Codec(_) => (StatusCode::BAD_REQUEST, "invalid argument"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "invalid argument"),
            Self::SessionNotFound(_) => (StatusCode::NOT_FOUND, "invalid session id"),
            Self::Distributor(err) => match err {
                DistributorError::NoMatchingNode | DistributorError::SessionNotCreated(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "session not created")
                }
                DistributorError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "invalid session id"),
                DistributorError::DuplicateNode(_) => (StatusCode::CONFLICT, "invalid argument"),
                DistributorError::NodeNotFound(_) => (StatusCode::NOT_FOUND, "invalid argument"),
            },
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "unknown error"),
            Self::UpstreamTimeout => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = encode_error(code, &self.to_string()).to_string();
        let mut response = (status, body).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        response
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
