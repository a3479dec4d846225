//! New-session payload decoding errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(String),

    #[error("Expected a JSON object for {0}")]
    NotAnObject(String),

    #[error("Payload carries no capabilities")]
    MissingCapabilities,

    #[error("Capability '{0}' appears in both alwaysMatch and firstMatch")]
    ConflictingKey(String),
}
