//! # In-Memory Document Store
//!
//! `DataStore` backed by hash maps. Used by the node binary and by tests.
//!
//! Mirrors the document layout of a real store: an event holds the ids of
//! its readings, readings are separate records, and reads hydrate the event
//! from those records. A reading deleted on its own simply drops out of its
//! event on the next read. Every operation touches one lock acquisition, so
//! single-record writes are atomic and nothing spans records.

use crate::error::{StoreError, StoreResult};
use crate::ports::outbound::{DataStore, TimeSource};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Event, Reading, Timestamp, ValueDescriptor};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

struct StoredEvent {
    /// Event document without readings.
    event: Event,
    /// `None` when the event was stored without a reading collection.
    reading_ids: Option<Vec<String>>,
    seq: u64,
}

struct StoredReading {
    reading: Reading,
    seq: u64,
}

#[derive(Default)]
struct Tables {
    events: HashMap<String, StoredEvent>,
    readings: HashMap<String, StoredReading>,
    descriptors: HashMap<String, ValueDescriptor>,
    next_seq: u64,
}

impl Tables {
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn hydrate(&self, stored: &StoredEvent) -> Event {
        let mut event = stored.event.clone();
        event.readings = stored.reading_ids.as_ref().map(|ids| {
            ids.iter()
                .filter_map(|id| self.readings.get(id).map(|r| r.reading.clone()))
                .collect()
        });
        event
    }

    /// Events matching `filter`, newest first.
    fn events_where<F>(&self, filter: F) -> Vec<&StoredEvent>
    where
        F: Fn(&Event) -> bool,
    {
        let mut matched: Vec<&StoredEvent> =
            self.events.values().filter(|s| filter(&s.event)).collect();
        matched.sort_by(|a, b| {
            b.event
                .created
                .cmp(&a.event.created)
                .then(b.seq.cmp(&a.seq))
        });
        matched
    }

    /// Readings matching `filter`, in insertion order.
    fn readings_where<F>(&self, limit: usize, filter: F) -> Vec<Reading>
    where
        F: Fn(&Reading) -> bool,
    {
        let mut matched: Vec<&StoredReading> = self
            .readings
            .values()
            .filter(|s| filter(&s.reading))
            .collect();
        matched.sort_by_key(|s| s.seq);
        matched
            .into_iter()
            .take(limit)
            .map(|s| s.reading.clone())
            .collect()
    }
}

/// In-memory `DataStore`.
pub struct InMemoryDataStore {
    tables: RwLock<Tables>,
    clock: Arc<dyn TimeSource>,
}

impl InMemoryDataStore {
    /// Create an empty store. `clock` evaluates event ages.
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            clock,
        }
    }
}

fn check_id(id: &str) -> StoreResult<()> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| StoreError::InvalidObjectId(id.to_string()))
}

fn require_id(id: &str) -> StoreResult<()> {
    if id.is_empty() {
        return Err(StoreError::Backend("record id must be assigned".to_string()));
    }
    Ok(())
}

#[async_trait]
impl DataStore for InMemoryDataStore {
    async fn add_event(&self, event: &Event) -> StoreResult<()> {
        require_id(&event.id)?;
        let mut tables = self.tables.write();

        if tables.events.contains_key(&event.id) {
            return Err(StoreError::NotUnique);
        }
        for reading in event.readings.iter().flatten() {
            require_id(&reading.id)?;
            if tables.readings.contains_key(&reading.id) {
                return Err(StoreError::NotUnique);
            }
        }

        for reading in event.readings.iter().flatten() {
            let seq = tables.seq();
            tables.readings.insert(
                reading.id.clone(),
                StoredReading {
                    reading: reading.clone(),
                    seq,
                },
            );
        }

        let mut document = event.clone();
        document.readings = None;
        let seq = tables.seq();
        tables.events.insert(
            event.id.clone(),
            StoredEvent {
                event: document,
                reading_ids: event.reading_ids(),
                seq,
            },
        );
        Ok(())
    }

    async fn event_by_id(&self, id: &str) -> StoreResult<Event> {
        check_id(id)?;
        let tables = self.tables.read();
        tables
            .events
            .get(id)
            .map(|stored| tables.hydrate(stored))
            .ok_or(StoreError::NotFound)
    }

    async fn update_event(&self, event: &Event) -> StoreResult<()> {
        check_id(&event.id)?;
        let mut tables = self.tables.write();
        let stored = tables.events.get_mut(&event.id).ok_or(StoreError::NotFound)?;
        let mut document = event.clone();
        document.readings = None;
        stored.event = document;
        Ok(())
    }

    async fn delete_event_by_id(&self, id: &str) -> StoreResult<()> {
        check_id(id)?;
        self.tables
            .write()
            .events
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn events(&self, limit: usize) -> StoreResult<Vec<Event>> {
        let tables = self.tables.read();
        Ok(tables
            .events_where(|_| true)
            .into_iter()
            .take(limit)
            .map(|s| tables.hydrate(s))
            .collect())
    }

    async fn events_for_device_limit(
        &self,
        device: &str,
        limit: usize,
    ) -> StoreResult<Vec<Event>> {
        let tables = self.tables.read();
        Ok(tables
            .events_where(|e| e.device == device)
            .into_iter()
            .take(limit)
            .map(|s| tables.hydrate(s))
            .collect())
    }

    async fn events_by_creation_time(
        &self,
        start: Timestamp,
        end: Timestamp,
        limit: usize,
    ) -> StoreResult<Vec<Event>> {
        let tables = self.tables.read();
        let mut matched = tables.events_where(|e| e.created >= start && e.created <= end);
        matched.reverse();
        Ok(matched
            .into_iter()
            .take(limit)
            .map(|s| tables.hydrate(s))
            .collect())
    }

    async fn events_older_than_age(&self, age_millis: i64) -> StoreResult<Vec<Event>> {
        let now = self.clock.now_millis();
        let tables = self.tables.read();
        Ok(tables
            .events_where(|e| now.saturating_sub(e.created) > age_millis)
            .into_iter()
            .map(|s| tables.hydrate(s))
            .collect())
    }

    async fn events_pushed(&self) -> StoreResult<Vec<Event>> {
        let tables = self.tables.read();
        Ok(tables
            .events_where(Event::is_pushed)
            .into_iter()
            .map(|s| tables.hydrate(s))
            .collect())
    }

    async fn events_by_checksum(&self, checksum: &str) -> StoreResult<Vec<Event>> {
        let tables = self.tables.read();
        Ok(tables
            .events_where(|e| e.checksum == checksum)
            .into_iter()
            .map(|s| tables.hydrate(s))
            .collect())
    }

    async fn delete_events_by_device(&self, device: &str) -> StoreResult<usize> {
        let mut tables = self.tables.write();
        let before = tables.events.len();
        tables.events.retain(|_, s| s.event.device != device);
        Ok(before - tables.events.len())
    }

    async fn event_count(&self) -> StoreResult<usize> {
        Ok(self.tables.read().events.len())
    }

    async fn event_count_by_device(&self, device: &str) -> StoreResult<usize> {
        Ok(self
            .tables
            .read()
            .events
            .values()
            .filter(|s| s.event.device == device)
            .count())
    }

    async fn scrub_all_events(&self) -> StoreResult<()> {
        let mut tables = self.tables.write();
        tables.events.clear();
        tables.readings.clear();
        Ok(())
    }

    async fn add_reading(&self, reading: &Reading) -> StoreResult<()> {
        require_id(&reading.id)?;
        let mut tables = self.tables.write();
        if tables.readings.contains_key(&reading.id) {
            return Err(StoreError::NotUnique);
        }
        let seq = tables.seq();
        tables.readings.insert(
            reading.id.clone(),
            StoredReading {
                reading: reading.clone(),
                seq,
            },
        );
        Ok(())
    }

    async fn reading_by_id(&self, id: &str) -> StoreResult<Reading> {
        check_id(id)?;
        self.tables
            .read()
            .readings
            .get(id)
            .map(|s| s.reading.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn update_reading(&self, reading: &Reading) -> StoreResult<()> {
        check_id(&reading.id)?;
        let mut tables = self.tables.write();
        let stored = tables
            .readings
            .get_mut(&reading.id)
            .ok_or(StoreError::NotFound)?;
        stored.reading = reading.clone();
        Ok(())
    }

    async fn delete_reading_by_id(&self, id: &str) -> StoreResult<()> {
        check_id(id)?;
        self.tables
            .write()
            .readings
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn readings(&self, limit: usize) -> StoreResult<Vec<Reading>> {
        Ok(self.tables.read().readings_where(limit, |_| true))
    }

    async fn readings_by_device(&self, device: &str, limit: usize) -> StoreResult<Vec<Reading>> {
        Ok(self
            .tables
            .read()
            .readings_where(limit, |r| r.device == device))
    }

    async fn readings_by_value_descriptor(
        &self,
        name: &str,
        limit: usize,
    ) -> StoreResult<Vec<Reading>> {
        Ok(self.tables.read().readings_where(limit, |r| r.name == name))
    }

    async fn readings_by_value_descriptor_names(
        &self,
        names: &[String],
        limit: usize,
    ) -> StoreResult<Vec<Reading>> {
        Ok(self
            .tables
            .read()
            .readings_where(limit, |r| names.contains(&r.name)))
    }

    async fn readings_by_device_and_value_descriptor(
        &self,
        device: &str,
        name: &str,
        limit: usize,
    ) -> StoreResult<Vec<Reading>> {
        Ok(self
            .tables
            .read()
            .readings_where(limit, |r| r.device == device && r.name == name))
    }

    async fn readings_by_creation_time(
        &self,
        start: Timestamp,
        end: Timestamp,
        limit: usize,
    ) -> StoreResult<Vec<Reading>> {
        let tables = self.tables.read();
        let mut matched: Vec<&StoredReading> = tables
            .readings
            .values()
            .filter(|s| s.reading.created >= start && s.reading.created <= end)
            .collect();
        matched.sort_by_key(|s| (s.reading.created, s.seq));
        Ok(matched
            .into_iter()
            .take(limit)
            .map(|s| s.reading.clone())
            .collect())
    }

    async fn delete_readings_by_device(&self, device: &str) -> StoreResult<usize> {
        let mut tables = self.tables.write();
        let before = tables.readings.len();
        tables.readings.retain(|_, s| s.reading.device != device);
        Ok(before - tables.readings.len())
    }

    async fn reading_count(&self) -> StoreResult<usize> {
        Ok(self.tables.read().readings.len())
    }

    async fn add_value_descriptor(&self, descriptor: &ValueDescriptor) -> StoreResult<()> {
        require_id(&descriptor.id)?;
        let mut tables = self.tables.write();
        let taken = tables.descriptors.contains_key(&descriptor.id)
            || tables
                .descriptors
                .values()
                .any(|vd| vd.name == descriptor.name);
        if taken {
            return Err(StoreError::NotUnique);
        }
        tables
            .descriptors
            .insert(descriptor.id.clone(), descriptor.clone());
        Ok(())
    }

    async fn value_descriptor_by_id(&self, id: &str) -> StoreResult<ValueDescriptor> {
        check_id(id)?;
        self.tables
            .read()
            .descriptors
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn value_descriptor_by_name(&self, name: &str) -> StoreResult<ValueDescriptor> {
        self.tables
            .read()
            .descriptors
            .values()
            .find(|vd| vd.name == name)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn value_descriptors(&self) -> StoreResult<Vec<ValueDescriptor>> {
        let mut all: Vec<ValueDescriptor> =
            self.tables.read().descriptors.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn value_descriptors_by_label(&self, label: &str) -> StoreResult<Vec<ValueDescriptor>> {
        let mut matched: Vec<ValueDescriptor> = self
            .tables
            .read()
            .descriptors
            .values()
            .filter(|vd| vd.has_label(label))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matched)
    }

    async fn value_descriptors_by_uom_label(
        &self,
        uom_label: &str,
    ) -> StoreResult<Vec<ValueDescriptor>> {
        let mut matched: Vec<ValueDescriptor> = self
            .tables
            .read()
            .descriptors
            .values()
            .filter(|vd| vd.uom_label == uom_label)
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matched)
    }

    async fn value_descriptors_by_type(
        &self,
        value_type: &str,
    ) -> StoreResult<Vec<ValueDescriptor>> {
        let mut matched: Vec<ValueDescriptor> = self
            .tables
            .read()
            .descriptors
            .values()
            .filter(|vd| vd.value_type == value_type)
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matched)
    }

    async fn update_value_descriptor(&self, descriptor: &ValueDescriptor) -> StoreResult<()> {
        check_id(&descriptor.id)?;
        let mut tables = self.tables.write();
        let collides = tables
            .descriptors
            .values()
            .any(|vd| vd.id != descriptor.id && vd.name == descriptor.name);
        if collides {
            return Err(StoreError::NotUnique);
        }
        let stored = tables
            .descriptors
            .get_mut(&descriptor.id)
            .ok_or(StoreError::NotFound)?;
        *stored = descriptor.clone();
        Ok(())
    }

    async fn delete_value_descriptor_by_id(&self, id: &str) -> StoreResult<()> {
        check_id(id)?;
        self.tables
            .write()
            .descriptors
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::time::ManualTimeSource;

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn event_at(device: &str, created: Timestamp, readings: usize) -> Event {
        let readings = (0..readings)
            .map(|i| Reading {
                id: new_id(),
                device: device.to_string(),
                name: format!("r{i}"),
                value: i.to_string(),
                created,
                ..Default::default()
            })
            .collect();
        Event {
            id: new_id(),
            device: device.to_string(),
            created,
            readings: Some(readings),
            ..Default::default()
        }
    }

    fn store_at(now: Timestamp) -> (InMemoryDataStore, Arc<ManualTimeSource>) {
        let clock = Arc::new(ManualTimeSource::new(now));
        (InMemoryDataStore::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_add_event_stores_readings_separately() {
        let (store, _) = store_at(0);
        let event = event_at("pump-1", 10, 2);

        store.add_event(&event).await.unwrap();

        assert_eq!(store.event_count().await.unwrap(), 1);
        assert_eq!(store.reading_count().await.unwrap(), 2);
        let loaded = store.event_by_id(&event.id).await.unwrap();
        assert_eq!(loaded.readings, event.readings);
    }

    #[tokio::test]
    async fn test_deleted_reading_drops_out_of_event() {
        let (store, _) = store_at(0);
        let event = event_at("pump-1", 10, 2);
        store.add_event(&event).await.unwrap();

        let first = event.reading_ids().unwrap()[0].clone();
        store.delete_reading_by_id(&first).await.unwrap();

        let loaded = store.event_by_id(&event.id).await.unwrap();
        assert_eq!(loaded.reading_count(), 1);
    }

    #[tokio::test]
    async fn test_absent_reading_collection_survives_round_trip() {
        let (store, _) = store_at(0);
        let mut event = event_at("pump-1", 10, 0);
        event.readings = None;
        store.add_event(&event).await.unwrap();

        let loaded = store.event_by_id(&event.id).await.unwrap();
        assert_eq!(loaded.readings, None);
    }

    #[tokio::test]
    async fn test_malformed_id_rejected() {
        let (store, _) = store_at(0);
        let result = store.event_by_id("not-an-id").await;
        assert!(matches!(result, Err(StoreError::InvalidObjectId(_))));

        let result = store.event_by_id(&new_id()).await;
        assert_eq!(result, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_older_than_age_is_strict() {
        let (store, _) = store_at(1_000);
        let exact = event_at("pump-1", 900, 0);
        let older = event_at("pump-1", 899, 0);
        store.add_event(&exact).await.unwrap();
        store.add_event(&older).await.unwrap();

        let matched = store.events_older_than_age(100).await.unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, older.id);

        assert_eq!(store.events_older_than_age(-1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_events_newest_first_with_limit() {
        let (store, _) = store_at(0);
        for created in [10, 30, 20] {
            store.add_event(&event_at("pump-1", created, 0)).await.unwrap();
        }

        let events = store.events_for_device_limit("pump-1", 2).await.unwrap();
        let created: Vec<Timestamp> = events.iter().map(|e| e.created).collect();
        assert_eq!(created, vec![30, 20]);

        let ranged = store.events_by_creation_time(10, 20, 10).await.unwrap();
        let created: Vec<Timestamp> = ranged.iter().map(|e| e.created).collect();
        assert_eq!(created, vec![10, 20]);
    }

    #[tokio::test]
    async fn test_bulk_device_deletes() {
        let (store, _) = store_at(0);
        store.add_event(&event_at("pump-1", 1, 2)).await.unwrap();
        store.add_event(&event_at("pump-1", 2, 1)).await.unwrap();
        store.add_event(&event_at("pump-2", 3, 1)).await.unwrap();

        assert_eq!(store.delete_readings_by_device("pump-1").await.unwrap(), 3);
        assert_eq!(store.delete_events_by_device("pump-1").await.unwrap(), 2);
        assert_eq!(store.event_count().await.unwrap(), 1);
        assert_eq!(store.reading_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_descriptor_names_unique() {
        let (store, _) = store_at(0);
        let mut first = ValueDescriptor::new("temperature", "Float32");
        first.id = new_id();
        let mut second = ValueDescriptor::new("temperature", "Int64");
        second.id = new_id();

        store.add_value_descriptor(&first).await.unwrap();
        assert_eq!(
            store.add_value_descriptor(&second).await,
            Err(StoreError::NotUnique)
        );

        second.name = "humidity".to_string();
        store.add_value_descriptor(&second).await.unwrap();
        second.name = "temperature".to_string();
        assert_eq!(
            store.update_value_descriptor(&second).await,
            Err(StoreError::NotUnique)
        );
    }
}
