//! Fixtures and instrumented adapters shared by the unit tests.

use crate::adapters::{InMemoryDataStore, ManualTimeSource, StaticDeviceResolver};
use crate::config::CoreDataConfig;
use crate::error::{StoreError, StoreResult};
use crate::pipeline::{NotificationPipeline, PipelineHandle, PipelineReport};
use crate::ports::outbound::{BusPublisher, DataStore};
use crate::service::{CoreDataDependencies, CoreDataService};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_bus::{BusError, MessageEnvelope};
use shared_types::{DeviceInfo, Event, Reading, Timestamp, ValueDescriptor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use uuid::Uuid;

pub const DEVICE: &str = "thermostat-01";
pub const DEVICE_ID: &str = "dev-1";
pub const START: Timestamp = 1_000_000;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn thermostat() -> DeviceInfo {
    DeviceInfo {
        id: DEVICE_ID.to_string(),
        name: DEVICE.to_string(),
        value_descriptor_names: vec!["temperature".to_string(), "humidity".to_string()],
    }
}

pub fn make_descriptor(name: &str) -> ValueDescriptor {
    ValueDescriptor::new(name, "Float32").with_formatting("%.2f")
}

/// Unstamped event with one reading per name.
pub fn make_event(device: &str, names: &[&str]) -> Event {
    let readings = names
        .iter()
        .enumerate()
        .map(|(i, name)| Reading::new(*name, i.to_string()).with_origin(START))
        .collect();
    Event::new(device, START, readings)
}

/// Stored reading with every id assigned.
pub fn make_reading(device: &str, name: &str, created: Timestamp) -> Reading {
    Reading {
        id: new_id(),
        device: device.to_string(),
        name: name.to_string(),
        value: "1".to_string(),
        created,
        ..Default::default()
    }
}

// =============================================================================
// RECORDING STORE
// =============================================================================

struct Failure {
    op: &'static str,
    key: Option<String>,
    error: StoreError,
}

/// `InMemoryDataStore` that records every call and fails on request.
pub struct RecordingStore {
    inner: InMemoryDataStore,
    calls: Mutex<Vec<String>>,
    failures: Mutex<Vec<Failure>>,
    stalled: Mutex<Vec<&'static str>>,
    gates: Mutex<Vec<(&'static str, Arc<Semaphore>)>>,
}

impl RecordingStore {
    pub fn new(clock: Arc<ManualTimeSource>) -> Self {
        Self {
            inner: InMemoryDataStore::new(clock),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            stalled: Mutex::new(Vec::new()),
            gates: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call to `op`, or only those addressing `key`.
    pub fn fail(&self, op: &'static str, key: Option<&str>, error: StoreError) {
        self.failures.lock().push(Failure {
            op,
            key: key.map(str::to_string),
            error,
        });
    }

    /// Make every call to `op` hang forever.
    pub fn stall(&self, op: &'static str) {
        self.stalled.lock().push(op);
    }

    /// Hold every call to `op` until a permit is added to the returned gate.
    /// Each call consumes one permit.
    pub fn gate(&self, op: &'static str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates.lock().push((op, gate.clone()));
        gate
    }

    /// Calls so far, as `op(key)`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Calls to `op` so far.
    pub fn calls_to(&self, op: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.split('(').next() == Some(op))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    async fn enter(&self, op: &'static str, key: &str) -> StoreResult<()> {
        self.calls.lock().push(format!("{op}({key})"));

        let failure = self
            .failures
            .lock()
            .iter()
            .find(|f| f.op == op && f.key.as_deref().map_or(true, |k| k == key))
            .map(|f| f.error.clone());
        if let Some(error) = failure {
            return Err(error);
        }

        let stalled = self.stalled.lock().contains(&op);
        if stalled {
            std::future::pending::<()>().await;
        }

        let gate = self
            .gates
            .lock()
            .iter()
            .find(|(gated, _)| *gated == op)
            .map(|(_, gate)| gate.clone());
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DataStore for RecordingStore {
    async fn add_event(&self, event: &Event) -> StoreResult<()> {
        self.enter("add_event", &event.id).await?;
        self.inner.add_event(event).await
    }

    async fn event_by_id(&self, id: &str) -> StoreResult<Event> {
        self.enter("event_by_id", id).await?;
        self.inner.event_by_id(id).await
    }

    async fn update_event(&self, event: &Event) -> StoreResult<()> {
        self.enter("update_event", &event.id).await?;
        self.inner.update_event(event).await
    }

    async fn delete_event_by_id(&self, id: &str) -> StoreResult<()> {
        self.enter("delete_event_by_id", id).await?;
        self.inner.delete_event_by_id(id).await
    }

    async fn events(&self, limit: usize) -> StoreResult<Vec<Event>> {
        self.enter("events", "").await?;
        self.inner.events(limit).await
    }

    async fn events_for_device_limit(
        &self,
        device: &str,
        limit: usize,
    ) -> StoreResult<Vec<Event>> {
        self.enter("events_for_device_limit", device).await?;
        self.inner.events_for_device_limit(device, limit).await
    }

    async fn events_by_creation_time(
        &self,
        start: Timestamp,
        end: Timestamp,
        limit: usize,
    ) -> StoreResult<Vec<Event>> {
        self.enter("events_by_creation_time", "").await?;
        self.inner.events_by_creation_time(start, end, limit).await
    }

    async fn events_older_than_age(&self, age_millis: i64) -> StoreResult<Vec<Event>> {
        self.enter("events_older_than_age", "").await?;
        self.inner.events_older_than_age(age_millis).await
    }

    async fn events_pushed(&self) -> StoreResult<Vec<Event>> {
        self.enter("events_pushed", "").await?;
        self.inner.events_pushed().await
    }

    async fn events_by_checksum(&self, checksum: &str) -> StoreResult<Vec<Event>> {
        self.enter("events_by_checksum", checksum).await?;
        self.inner.events_by_checksum(checksum).await
    }

    async fn delete_events_by_device(&self, device: &str) -> StoreResult<usize> {
        self.enter("delete_events_by_device", device).await?;
        self.inner.delete_events_by_device(device).await
    }

    async fn event_count(&self) -> StoreResult<usize> {
        self.enter("event_count", "").await?;
        self.inner.event_count().await
    }

    async fn event_count_by_device(&self, device: &str) -> StoreResult<usize> {
        self.enter("event_count_by_device", device).await?;
        self.inner.event_count_by_device(device).await
    }

    async fn scrub_all_events(&self) -> StoreResult<()> {
        self.enter("scrub_all_events", "").await?;
        self.inner.scrub_all_events().await
    }

    async fn add_reading(&self, reading: &Reading) -> StoreResult<()> {
        self.enter("add_reading", &reading.id).await?;
        self.inner.add_reading(reading).await
    }

    async fn reading_by_id(&self, id: &str) -> StoreResult<Reading> {
        self.enter("reading_by_id", id).await?;
        self.inner.reading_by_id(id).await
    }

    async fn update_reading(&self, reading: &Reading) -> StoreResult<()> {
        self.enter("update_reading", &reading.id).await?;
        self.inner.update_reading(reading).await
    }

    async fn delete_reading_by_id(&self, id: &str) -> StoreResult<()> {
        self.enter("delete_reading_by_id", id).await?;
        self.inner.delete_reading_by_id(id).await
    }

    async fn readings(&self, limit: usize) -> StoreResult<Vec<Reading>> {
        self.enter("readings", "").await?;
        self.inner.readings(limit).await
    }

    async fn readings_by_device(&self, device: &str, limit: usize) -> StoreResult<Vec<Reading>> {
        self.enter("readings_by_device", device).await?;
        self.inner.readings_by_device(device, limit).await
    }

    async fn readings_by_value_descriptor(
        &self,
        name: &str,
        limit: usize,
    ) -> StoreResult<Vec<Reading>> {
        self.enter("readings_by_value_descriptor", name).await?;
        self.inner.readings_by_value_descriptor(name, limit).await
    }

    async fn readings_by_value_descriptor_names(
        &self,
        names: &[String],
        limit: usize,
    ) -> StoreResult<Vec<Reading>> {
        self.enter("readings_by_value_descriptor_names", &names.join(","))
            .await?;
        self.inner
            .readings_by_value_descriptor_names(names, limit)
            .await
    }

    async fn readings_by_device_and_value_descriptor(
        &self,
        device: &str,
        name: &str,
        limit: usize,
    ) -> StoreResult<Vec<Reading>> {
        self.enter("readings_by_device_and_value_descriptor", name)
            .await?;
        self.inner
            .readings_by_device_and_value_descriptor(device, name, limit)
            .await
    }

    async fn readings_by_creation_time(
        &self,
        start: Timestamp,
        end: Timestamp,
        limit: usize,
    ) -> StoreResult<Vec<Reading>> {
        self.enter("readings_by_creation_time", "").await?;
        self.inner.readings_by_creation_time(start, end, limit).await
    }

    async fn delete_readings_by_device(&self, device: &str) -> StoreResult<usize> {
        self.enter("delete_readings_by_device", device).await?;
        self.inner.delete_readings_by_device(device).await
    }

    async fn reading_count(&self) -> StoreResult<usize> {
        self.enter("reading_count", "").await?;
        self.inner.reading_count().await
    }

    async fn add_value_descriptor(&self, descriptor: &ValueDescriptor) -> StoreResult<()> {
        self.enter("add_value_descriptor", &descriptor.name).await?;
        self.inner.add_value_descriptor(descriptor).await
    }

    async fn value_descriptor_by_id(&self, id: &str) -> StoreResult<ValueDescriptor> {
        self.enter("value_descriptor_by_id", id).await?;
        self.inner.value_descriptor_by_id(id).await
    }

    async fn value_descriptor_by_name(&self, name: &str) -> StoreResult<ValueDescriptor> {
        self.enter("value_descriptor_by_name", name).await?;
        self.inner.value_descriptor_by_name(name).await
    }

    async fn value_descriptors(&self) -> StoreResult<Vec<ValueDescriptor>> {
        self.enter("value_descriptors", "").await?;
        self.inner.value_descriptors().await
    }

    async fn value_descriptors_by_label(&self, label: &str) -> StoreResult<Vec<ValueDescriptor>> {
        self.enter("value_descriptors_by_label", label).await?;
        self.inner.value_descriptors_by_label(label).await
    }

    async fn value_descriptors_by_uom_label(
        &self,
        uom_label: &str,
    ) -> StoreResult<Vec<ValueDescriptor>> {
        self.enter("value_descriptors_by_uom_label", uom_label)
            .await?;
        self.inner.value_descriptors_by_uom_label(uom_label).await
    }

    async fn value_descriptors_by_type(
        &self,
        value_type: &str,
    ) -> StoreResult<Vec<ValueDescriptor>> {
        self.enter("value_descriptors_by_type", value_type).await?;
        self.inner.value_descriptors_by_type(value_type).await
    }

    async fn update_value_descriptor(&self, descriptor: &ValueDescriptor) -> StoreResult<()> {
        self.enter("update_value_descriptor", &descriptor.id).await?;
        self.inner.update_value_descriptor(descriptor).await
    }

    async fn delete_value_descriptor_by_id(&self, id: &str) -> StoreResult<()> {
        self.enter("delete_value_descriptor_by_id", id).await?;
        self.inner.delete_value_descriptor_by_id(id).await
    }
}

// =============================================================================
// RECORDING PUBLISHER
// =============================================================================

/// `BusPublisher` that keeps every envelope it accepts.
///
/// With a gate, each publish first takes a permit, so a test controls how
/// far the worker gets.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<(String, MessageEnvelope)>>,
    failing: AtomicBool,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<(String, MessageEnvelope)> {
        self.published.lock().clone()
    }

    /// Decoded events, in publish order.
    pub fn events(&self) -> Vec<Event> {
        self.published
            .lock()
            .iter()
            .map(|(_, envelope)| envelope.decode_json().unwrap())
            .collect()
    }
}

#[async_trait]
impl BusPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, envelope: MessageEnvelope) -> Result<(), BusError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }
        self.published.lock().push((topic.to_string(), envelope));
        Ok(())
    }
}

// =============================================================================
// HARNESS
// =============================================================================

/// A service over recording adapters with a running notification worker.
pub struct Harness {
    pub service: CoreDataService,
    pub store: Arc<RecordingStore>,
    pub resolver: Arc<StaticDeviceResolver>,
    pub clock: Arc<ManualTimeSource>,
    pub publisher: Arc<RecordingPublisher>,
    pub pipeline: Option<PipelineHandle>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(CoreDataConfig::default())
    }

    pub fn with_config(config: CoreDataConfig) -> Self {
        Self::build(config, Arc::new(RecordingPublisher::new()))
    }

    pub fn build(config: CoreDataConfig, publisher: Arc<RecordingPublisher>) -> Self {
        let clock = Arc::new(ManualTimeSource::new(START));
        let store = Arc::new(RecordingStore::new(clock.clone()));
        let resolver = Arc::new(StaticDeviceResolver::new().with_device(thermostat()));

        let pipeline = NotificationPipeline::from_config(&config);
        let notifier = pipeline.sender();
        let pipeline = pipeline.start(publisher.clone(), clock.clone());

        let deps = CoreDataDependencies {
            store: store.clone(),
            resolver: resolver.clone(),
            notifier,
            clock: clock.clone(),
        };

        Self {
            service: CoreDataService::new(deps, config),
            store,
            resolver,
            clock,
            publisher,
            pipeline: Some(pipeline),
        }
    }

    /// Stop the worker after it has published everything queued.
    pub async fn shutdown(&mut self) -> PipelineReport {
        self.pipeline.take().unwrap().shutdown().await
    }

    /// Store a descriptor directly, bypassing the service.
    pub async fn seed_descriptor(&self, name: &str) -> ValueDescriptor {
        let mut descriptor = make_descriptor(name);
        descriptor.id = new_id();
        self.store.add_value_descriptor(&descriptor).await.unwrap();
        descriptor
    }

    /// Store a standalone reading directly, bypassing the service.
    pub async fn seed_reading(&self, name: &str) -> Reading {
        let reading = make_reading(DEVICE, name, START);
        self.store.add_reading(&reading).await.unwrap();
        reading
    }
}
