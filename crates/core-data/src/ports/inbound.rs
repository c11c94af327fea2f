//! # Inbound Ports (Driving Ports)
//!
//! The operations exposed to the routing layer, grouped by concern. Every
//! call takes the caller's `RequestContext`; cancelling it aborts the
//! in-flight store or registry round-trip.

use crate::context::RequestContext;
use crate::error::CoreDataResult;
use crate::ports::outbound::DeviceRef;
use async_trait::async_trait;
use shared_types::{Event, Reading, Timestamp, ValueDescriptor};

/// Whether the "event created" signal reached the notification queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStatus {
    /// Queued for the bus worker.
    Enqueued,
    /// The queue stayed full for the whole enqueue timeout.
    Dropped,
}

/// Outcome of `add_event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddEventReceipt {
    /// Identifier assigned to the event, persisted or not.
    pub id: String,
    /// Content checksum the event was stored and published with.
    pub checksum: String,
    /// Whether the notification was handed to the worker.
    pub notification: NotificationStatus,
}

/// Usage of one value descriptor by readings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorUsage {
    pub name: String,
    pub in_use: bool,
}

/// Event ingestion, lookup, acknowledgment and deletion.
#[async_trait]
pub trait EventApi: Send + Sync {
    /// Ingest an event.
    ///
    /// Persists it when persistence is enabled and always hands an "event
    /// created" signal to the notification pipeline.
    async fn add_event(&self, ctx: &RequestContext, event: Event)
        -> CoreDataResult<AddEventReceipt>;

    async fn event_by_id(&self, ctx: &RequestContext, id: &str) -> CoreDataResult<Event>;

    /// Up to `limit` events. `LimitExceeded` above the configured maximum.
    async fn events(&self, ctx: &RequestContext, limit: usize) -> CoreDataResult<Vec<Event>>;

    async fn events_by_device(
        &self,
        ctx: &RequestContext,
        device: &str,
        limit: usize,
    ) -> CoreDataResult<Vec<Event>>;

    /// Events created in `[start, end]`.
    async fn events_by_creation_time(
        &self,
        ctx: &RequestContext,
        start: Timestamp,
        end: Timestamp,
        limit: usize,
    ) -> CoreDataResult<Vec<Event>>;

    async fn event_count(&self, ctx: &RequestContext) -> CoreDataResult<usize>;

    async fn event_count_by_device(&self, ctx: &RequestContext, device: &str)
        -> CoreDataResult<usize>;

    /// Merge `patch.device` and `patch.origin` into the event `patch.id`.
    async fn update_event(&self, ctx: &RequestContext, patch: Event) -> CoreDataResult<()>;

    /// Mark the event as acknowledged now.
    async fn update_event_push_date(&self, ctx: &RequestContext, id: &str) -> CoreDataResult<()>;

    /// Mark every unacknowledged event with this checksum as acknowledged
    /// now. Returns how many were marked.
    async fn update_event_push_date_by_checksum(
        &self,
        ctx: &RequestContext,
        checksum: &str,
    ) -> CoreDataResult<usize>;

    /// Delete an event and the readings it owns.
    async fn delete_event_by_id(&self, ctx: &RequestContext, id: &str) -> CoreDataResult<()>;

    /// Delete every event and reading of a device. Returns the event count.
    async fn delete_events_by_device(
        &self,
        ctx: &RequestContext,
        device: &str,
    ) -> CoreDataResult<usize>;

    /// Delete every event and every reading.
    async fn delete_all_events(&self, ctx: &RequestContext) -> CoreDataResult<()>;
}

/// Retention sweeps.
#[async_trait]
pub trait RetentionApi: Send + Sync {
    /// Delete every event older than `age_millis`. A negative age selects
    /// every event. Returns the number of events removed.
    async fn scrub_by_age(&self, ctx: &RequestContext, age_millis: i64) -> CoreDataResult<usize>;

    /// Delete every acknowledged event. Returns the number removed.
    async fn scrub_pushed(&self, ctx: &RequestContext) -> CoreDataResult<usize>;
}

/// Reading operations.
#[async_trait]
pub trait ReadingApi: Send + Sync {
    /// Store a standalone reading. Returns its id.
    async fn add_reading(&self, ctx: &RequestContext, reading: Reading) -> CoreDataResult<String>;

    async fn reading_by_id(&self, ctx: &RequestContext, id: &str) -> CoreDataResult<Reading>;

    async fn readings(&self, ctx: &RequestContext, limit: usize) -> CoreDataResult<Vec<Reading>>;

    /// Merge `patch.value`, `patch.name` and `patch.origin` into the reading
    /// `patch.id`.
    async fn update_reading(&self, ctx: &RequestContext, patch: Reading) -> CoreDataResult<()>;

    async fn delete_reading_by_id(&self, ctx: &RequestContext, id: &str) -> CoreDataResult<()>;

    async fn reading_count(&self, ctx: &RequestContext) -> CoreDataResult<usize>;

    async fn readings_by_device(
        &self,
        ctx: &RequestContext,
        device: &str,
        limit: usize,
    ) -> CoreDataResult<Vec<Reading>>;

    async fn readings_by_value_descriptor(
        &self,
        ctx: &RequestContext,
        name: &str,
        limit: usize,
    ) -> CoreDataResult<Vec<Reading>>;

    async fn readings_by_device_and_value_descriptor(
        &self,
        ctx: &RequestContext,
        device: &str,
        name: &str,
        limit: usize,
    ) -> CoreDataResult<Vec<Reading>>;

    /// Readings of every descriptor with this unit label.
    async fn readings_by_uom_label(
        &self,
        ctx: &RequestContext,
        uom_label: &str,
        limit: usize,
    ) -> CoreDataResult<Vec<Reading>>;

    /// Readings of every descriptor carrying this label.
    async fn readings_by_label(
        &self,
        ctx: &RequestContext,
        label: &str,
        limit: usize,
    ) -> CoreDataResult<Vec<Reading>>;

    /// Readings of every descriptor of this value type.
    async fn readings_by_type(
        &self,
        ctx: &RequestContext,
        value_type: &str,
        limit: usize,
    ) -> CoreDataResult<Vec<Reading>>;

    async fn readings_by_creation_time(
        &self,
        ctx: &RequestContext,
        start: Timestamp,
        end: Timestamp,
        limit: usize,
    ) -> CoreDataResult<Vec<Reading>>;
}

/// Value descriptor registration, lookup and guarded mutation.
#[async_trait]
pub trait ValueDescriptorApi: Send + Sync {
    /// Register a descriptor. Returns its id.
    async fn add_value_descriptor(
        &self,
        ctx: &RequestContext,
        descriptor: ValueDescriptor,
    ) -> CoreDataResult<String>;

    async fn value_descriptor_by_id(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> CoreDataResult<ValueDescriptor>;

    async fn value_descriptor_by_name(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> CoreDataResult<ValueDescriptor>;

    async fn value_descriptors(&self, ctx: &RequestContext) -> CoreDataResult<Vec<ValueDescriptor>>;

    async fn value_descriptors_by_label(
        &self,
        ctx: &RequestContext,
        label: &str,
    ) -> CoreDataResult<Vec<ValueDescriptor>>;

    async fn value_descriptors_by_uom_label(
        &self,
        ctx: &RequestContext,
        uom_label: &str,
    ) -> CoreDataResult<Vec<ValueDescriptor>>;

    async fn value_descriptors_by_type(
        &self,
        ctx: &RequestContext,
        value_type: &str,
    ) -> CoreDataResult<Vec<ValueDescriptor>>;

    /// Descriptors declared by a device. Declared names with no stored
    /// descriptor are skipped.
    async fn value_descriptors_by_device(
        &self,
        ctx: &RequestContext,
        device: &DeviceRef,
    ) -> CoreDataResult<Vec<ValueDescriptor>>;

    /// Merge-patch the descriptor `patch.id`.
    async fn update_value_descriptor(
        &self,
        ctx: &RequestContext,
        patch: ValueDescriptor,
    ) -> CoreDataResult<()>;

    async fn delete_value_descriptor_by_id(&self, ctx: &RequestContext, id: &str)
        -> CoreDataResult<()>;

    async fn delete_value_descriptor_by_name(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> CoreDataResult<()>;

    /// Whether readings reference each descriptor. `None` checks all.
    async fn value_descriptor_usage(
        &self,
        ctx: &RequestContext,
        names: Option<Vec<String>>,
    ) -> CoreDataResult<Vec<DescriptorUsage>>;

    /// Check a descriptor's format string.
    fn validate_format_string(&self, descriptor: &ValueDescriptor) -> CoreDataResult<()>;
}
