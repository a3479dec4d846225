//! HTTP handlers and the axum adapter.
//!
//! - `session`: new session, end session, command forwarding
//! - `admin`: node membership and node-side session reports
//! - `monitoring`: grid status

pub mod routes;

pub(crate) mod admin;
pub(crate) mod monitoring;
pub(crate) mod session;

use webgrid_protocols::SessionId;

use crate::dispatch::PathParams;
use crate::error::DispatchError;

/// A captured path parameter. Missing parameters mean the rule table and the
/// handler disagree, which is reported as a bad request.
pub(crate) fn param<'a>(params: &'a PathParams, name: &str) -> Result<&'a str, DispatchError> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| DispatchError::InvalidArgument(format!("missing path parameter '{}'", name)))
}

pub(crate) fn session_param(params: &PathParams) -> Result<SessionId, DispatchError> {
    param(params, "sessionId").map(SessionId::new)
}
