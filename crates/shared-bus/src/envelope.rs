//! # Message Envelope
//!
//! The wire wrapper for everything published to the bus.

use crate::error::BusError;
use crate::PROTOCOL_VERSION;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Encoding of the envelope payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    /// `application/json`
    Json,
    /// `application/cbor` (opaque to this crate)
    Cbor,
}

impl ContentType {
    /// MIME type string.
    #[must_use]
    pub fn as_mime(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Cbor => "application/cbor",
        }
    }
}

/// A serialized payload plus the metadata consumers need to route and
/// acknowledge it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Protocol version.
    pub version: u16,
    /// Correlates the message with the request that produced it.
    pub correlation_id: Uuid,
    /// Content checksum of the carried payload's source, if any.
    pub checksum: String,
    /// Payload encoding.
    pub content_type: ContentType,
    /// Encoded payload.
    pub payload: Vec<u8>,
    /// Milliseconds since the Unix epoch when the envelope was built.
    pub timestamp: i64,
}

impl MessageEnvelope {
    /// Encode a value as a JSON envelope.
    pub fn json<T: Serialize>(
        correlation_id: Uuid,
        checksum: impl Into<String>,
        value: &T,
        timestamp: i64,
    ) -> Result<Self, BusError> {
        Ok(Self {
            version: PROTOCOL_VERSION,
            correlation_id,
            checksum: checksum.into(),
            content_type: ContentType::Json,
            payload: serde_json::to_vec(value)?,
            timestamp,
        })
    }

    /// Decode a JSON payload.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, BusError> {
        if self.content_type != ContentType::Json {
            return Err(BusError::UnsupportedContentType(
                self.content_type.as_mime().to_string(),
            ));
        }
        Ok(serde_json::from_slice(&self.payload)?)
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// An envelope together with the topic it was published to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Destination topic.
    pub topic: String,
    /// The published envelope.
    pub envelope: MessageEnvelope,
}
