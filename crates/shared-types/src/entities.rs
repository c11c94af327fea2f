//! # Core Telemetry Entities
//!
//! Events and the readings they own.
//!
//! ## Ownership
//!
//! - An `Event` exclusively owns its readings for creation and cascading
//!   deletion.
//! - Every reading inside an event also exists as an independently
//!   addressable `Reading` record.
//! - `readings: None` means the collection could not be enumerated (for
//!   example, it was never attached). `Some(vec![])` means the event has no
//!   readings. The two are not interchangeable.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Milliseconds since the Unix epoch. `0` means "not set".
pub type Timestamp = i64;

/// A timestamped record scoped to a device, owning zero or more readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Event {
    /// Store-assigned identifier. Empty until persisted or generated.
    #[serde(default)]
    pub id: String,
    /// Owning device name.
    pub device: String,
    /// Producer-assigned origin timestamp.
    #[serde(default)]
    pub origin: Timestamp,
    /// When the event was first stored.
    #[serde(default)]
    pub created: Timestamp,
    /// Last modification time.
    #[serde(default)]
    pub modified: Timestamp,
    /// When a downstream consumer acknowledged the event. `0` until then.
    #[serde(default)]
    pub pushed: Timestamp,
    /// Content checksum, used to acknowledge an event without its id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,
    /// Owned readings, in producer order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readings: Option<Vec<Reading>>,
}

impl Event {
    /// Create an event for a device with the given readings.
    pub fn new(device: impl Into<String>, origin: Timestamp, readings: Vec<Reading>) -> Self {
        Self {
            device: device.into(),
            origin,
            readings: Some(readings),
            ..Default::default()
        }
    }

    /// Whether a downstream consumer has acknowledged this event.
    #[must_use]
    pub fn is_pushed(&self) -> bool {
        self.pushed != 0
    }

    /// Ids of the owned readings, or `None` if the collection is absent.
    #[must_use]
    pub fn reading_ids(&self) -> Option<Vec<String>> {
        self.readings
            .as_ref()
            .map(|readings| readings.iter().map(|r| r.id.clone()).collect())
    }

    /// Number of owned readings (zero when the collection is absent).
    #[must_use]
    pub fn reading_count(&self) -> usize {
        self.readings.as_ref().map_or(0, Vec::len)
    }

    /// SHA-256 over the producer-supplied content, hex encoded.
    ///
    /// Store-assigned fields (ids, created/modified, pushed) are excluded so
    /// the same payload always yields the same checksum.
    #[must_use]
    pub fn compute_checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.device.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.origin.to_be_bytes());
        for reading in self.readings.iter().flatten() {
            hasher.update([0x1e]);
            hasher.update(reading.name.as_bytes());
            hasher.update([0u8]);
            hasher.update(reading.value.as_bytes());
            hasher.update([0u8]);
            hasher.update(reading.origin.to_be_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// A single measurement referencing a value descriptor by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Reading {
    /// Store-assigned identifier.
    #[serde(default)]
    pub id: String,
    /// Parent device name.
    #[serde(default)]
    pub device: String,
    /// Value descriptor name (foreign key by name).
    pub name: String,
    /// Measured value, encoded as text.
    pub value: String,
    /// Producer-assigned origin timestamp.
    #[serde(default)]
    pub origin: Timestamp,
    /// When the reading was first stored.
    #[serde(default)]
    pub created: Timestamp,
    /// Last modification time.
    #[serde(default)]
    pub modified: Timestamp,
    /// Acknowledgment timestamp, `0` until acknowledged.
    #[serde(default)]
    pub pushed: Timestamp,
}

impl Reading {
    /// Create a reading for a value descriptor.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Set the origin timestamp.
    #[must_use]
    pub fn with_origin(mut self, origin: Timestamp) -> Self {
        self.origin = origin;
        self
    }
}

/// Device summary as returned by the device registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeviceInfo {
    /// Registry identifier.
    pub id: String,
    /// Unique device name.
    pub name: String,
    /// Every value descriptor name the device's profile declares.
    pub value_descriptor_names: Vec<String>,
}
