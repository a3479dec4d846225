//! W3C new-session payload codec.
//!
//! Decodes the body of `POST /session` into a typed [`CapabilityRequest`]
//! and encodes the grid's JSON responses.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::CodecError;
use crate::types::{Capabilities, CapabilityRequest, SessionId};

#[derive(Debug, Deserialize)]
struct NewSessionPayload {
    capabilities: Option<W3cCapabilities>,
    #[serde(rename = "desiredCapabilities")]
    desired_capabilities: Option<Capabilities>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct W3cCapabilities {
    #[serde(default)]
    always_match: Capabilities,
    #[serde(default)]
    first_match: Vec<Capabilities>,
}

/// Decode a new-session request body.
///
/// W3C `capabilities` take precedence over legacy `desiredCapabilities`.
pub fn decode_new_session(body: &[u8]) -> Result<CapabilityRequest, CodecError> {
    let raw: Value =
        serde_json::from_slice(body).map_err(|e| CodecError::InvalidJson(e.to_string()))?;
    if !raw.is_object() {
        return Err(CodecError::NotAnObject("new session payload".to_string()));
    }
    for key in ["capabilities", "desiredCapabilities"] {
        if let Some(value) = raw.get(key) {
            if !value.is_object() {
                return Err(CodecError::NotAnObject(key.to_string()));
            }
        }
    }

    let payload: NewSessionPayload =
        serde_json::from_value(raw).map_err(|e| CodecError::InvalidJson(e.to_string()))?;

    if let Some(w3c) = payload.capabilities {
        return merge_alternatives(&w3c.always_match, &w3c.first_match);
    }
    match payload.desired_capabilities {
        Some(desired) => Ok(CapabilityRequest::single(desired)),
        None => Err(CodecError::MissingCapabilities),
    }
}

fn merge_alternatives(
    always_match: &Capabilities,
    first_match: &[Capabilities],
) -> Result<CapabilityRequest, CodecError> {
    if first_match.is_empty() {
        return Ok(CapabilityRequest::single(always_match.clone()));
    }
    let alternatives = first_match
        .iter()
        .map(|first| always_match.merge(first).map_err(CodecError::ConflictingKey))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CapabilityRequest::new(alternatives))
}

/// Wrap a payload in the W3C `{"value": ...}` envelope.
pub fn encode_value(value: Value) -> Value {
    json!({ "value": value })
}

/// Body answered to a successful new-session request.
pub fn encode_new_session(session_id: &SessionId, capabilities: &Capabilities) -> Value {
    encode_value(json!({
        "sessionId": session_id,
        "capabilities": capabilities,
    }))
}

/// W3C error body.
pub fn encode_error(error: &str, message: &str) -> Value {
    encode_value(json!({
        "error": error,
        "message": message,
        "stacktrace": "",
    }))
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
