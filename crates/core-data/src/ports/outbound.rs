//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the core data service. Each is injected at
//! construction, so tests substitute in-memory or failing implementations.
//!
//! - `DataStore`: per-entity CRUD and simple filtered queries. Only
//!   single-record operations are atomic.
//! - `DeviceResolver`: device name or id to its declared descriptor names.
//! - `BusPublisher`: fire-and-forget publish of an envelope to a topic.
//! - `TimeSource`: wall clock in milliseconds.

use crate::error::{ResolverError, StoreResult};
use async_trait::async_trait;
use shared_bus::{BusError, MessageEnvelope};
use shared_types::{DeviceInfo, Event, Reading, Timestamp, ValueDescriptor};
use std::fmt;

/// Document store facade.
///
/// Events reference their readings; every reading inside an event is also
/// stored as its own record. Reads hydrate an event's readings from those
/// records. All "not found" conditions are `StoreError::NotFound`.
#[async_trait]
pub trait DataStore: Send + Sync {
    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Store an event and each of its readings. Ids are assigned by the caller.
    async fn add_event(&self, event: &Event) -> StoreResult<()>;

    async fn event_by_id(&self, id: &str) -> StoreResult<Event>;

    /// Replace the stored event document. Reading records are not touched.
    async fn update_event(&self, event: &Event) -> StoreResult<()>;

    /// Delete the event record only.
    async fn delete_event_by_id(&self, id: &str) -> StoreResult<()>;

    /// Up to `limit` events, most recently created first.
    async fn events(&self, limit: usize) -> StoreResult<Vec<Event>>;

    /// Up to `limit` events of one device, most recently created first.
    async fn events_for_device_limit(&self, device: &str, limit: usize)
        -> StoreResult<Vec<Event>>;

    /// Events created in `[start, end]`, up to `limit`, oldest first.
    async fn events_by_creation_time(
        &self,
        start: Timestamp,
        end: Timestamp,
        limit: usize,
    ) -> StoreResult<Vec<Event>>;

    /// Events whose age, evaluated at call time, exceeds `age_millis`.
    async fn events_older_than_age(&self, age_millis: i64) -> StoreResult<Vec<Event>>;

    /// Events with a non-zero `pushed` timestamp.
    async fn events_pushed(&self) -> StoreResult<Vec<Event>>;

    async fn events_by_checksum(&self, checksum: &str) -> StoreResult<Vec<Event>>;

    /// Delete every event record of a device. Returns the number removed.
    async fn delete_events_by_device(&self, device: &str) -> StoreResult<usize>;

    async fn event_count(&self) -> StoreResult<usize>;

    async fn event_count_by_device(&self, device: &str) -> StoreResult<usize>;

    /// Delete every event and every reading.
    async fn scrub_all_events(&self) -> StoreResult<()>;

    // -------------------------------------------------------------------------
    // Readings
    // -------------------------------------------------------------------------

    async fn add_reading(&self, reading: &Reading) -> StoreResult<()>;

    async fn reading_by_id(&self, id: &str) -> StoreResult<Reading>;

    async fn update_reading(&self, reading: &Reading) -> StoreResult<()>;

    async fn delete_reading_by_id(&self, id: &str) -> StoreResult<()>;

    async fn readings(&self, limit: usize) -> StoreResult<Vec<Reading>>;

    async fn readings_by_device(&self, device: &str, limit: usize) -> StoreResult<Vec<Reading>>;

    async fn readings_by_value_descriptor(
        &self,
        name: &str,
        limit: usize,
    ) -> StoreResult<Vec<Reading>>;

    async fn readings_by_value_descriptor_names(
        &self,
        names: &[String],
        limit: usize,
    ) -> StoreResult<Vec<Reading>>;

    async fn readings_by_device_and_value_descriptor(
        &self,
        device: &str,
        name: &str,
        limit: usize,
    ) -> StoreResult<Vec<Reading>>;

    async fn readings_by_creation_time(
        &self,
        start: Timestamp,
        end: Timestamp,
        limit: usize,
    ) -> StoreResult<Vec<Reading>>;

    /// Delete every reading record of a device. Returns the number removed.
    async fn delete_readings_by_device(&self, device: &str) -> StoreResult<usize>;

    async fn reading_count(&self) -> StoreResult<usize>;

    // -------------------------------------------------------------------------
    // Value descriptors
    // -------------------------------------------------------------------------

    /// Register a descriptor. `StoreError::NotUnique` if the name is taken.
    async fn add_value_descriptor(&self, descriptor: &ValueDescriptor) -> StoreResult<()>;

    async fn value_descriptor_by_id(&self, id: &str) -> StoreResult<ValueDescriptor>;

    async fn value_descriptor_by_name(&self, name: &str) -> StoreResult<ValueDescriptor>;

    async fn value_descriptors(&self) -> StoreResult<Vec<ValueDescriptor>>;

    async fn value_descriptors_by_label(&self, label: &str) -> StoreResult<Vec<ValueDescriptor>>;

    async fn value_descriptors_by_uom_label(
        &self,
        uom_label: &str,
    ) -> StoreResult<Vec<ValueDescriptor>>;

    async fn value_descriptors_by_type(&self, value_type: &str)
        -> StoreResult<Vec<ValueDescriptor>>;

    /// Replace a descriptor. `StoreError::NotUnique` if a rename collides.
    async fn update_value_descriptor(&self, descriptor: &ValueDescriptor) -> StoreResult<()>;

    async fn delete_value_descriptor_by_id(&self, id: &str) -> StoreResult<()>;
}

/// How a caller names a device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceRef {
    Name(String),
    Id(String),
}

impl DeviceRef {
    /// The raw name or id.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Name(key) | Self::Id(key) => key,
        }
    }
}

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "name:{name}"),
            Self::Id(id) => write!(f, "id:{id}"),
        }
    }
}

/// Remote device registry.
#[async_trait]
pub trait DeviceResolver: Send + Sync {
    /// Resolve a device to its name and declared value-descriptor names.
    async fn device(&self, reference: &DeviceRef) -> Result<DeviceInfo, ResolverError>;
}

/// Message bus client. Success means the bus accepted the envelope.
#[async_trait]
pub trait BusPublisher: Send + Sync {
    async fn publish(&self, topic: &str, envelope: MessageEnvelope) -> Result<(), BusError>;
}

/// Abstract interface for time.
pub trait TimeSource: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> Timestamp;
}
