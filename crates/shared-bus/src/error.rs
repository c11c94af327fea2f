//! # Bus Errors

use thiserror::Error;

/// Errors from building or publishing envelopes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The payload could not be encoded or decoded.
    #[error("Envelope serialization failed: {0}")]
    Serialization(String),

    /// The payload's content type does not match the requested decoding.
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// The bus connection is closed.
    #[error("Message bus closed")]
    Closed,

    /// The bus rejected the message.
    #[error("Publish to {topic} failed: {reason}")]
    Publish { topic: String, reason: String },
}

impl From<serde_json::Error> for BusError {
    fn from(err: serde_json::Error) -> Self {
        BusError::Serialization(err.to_string())
    }
}
