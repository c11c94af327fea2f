//! Event operations: ingestion, lookup, acknowledgment and deletion.

use super::{lookup, query, CoreDataService};
use crate::context::RequestContext;
use crate::domain::merge_event;
use crate::error::{CoreDataError, CoreDataResult, EntityKind};
use crate::metrics;
use crate::pipeline::DomainSignal;
use crate::ports::inbound::{AddEventReceipt, EventApi, NotificationStatus};
use async_trait::async_trait;
use shared_types::{Event, Reading, Timestamp};
use tracing::{debug, info, warn};
use uuid::Uuid;

impl CoreDataService {
    /// Assign ids and timestamps, attach readings to the event's device and
    /// fill in the checksum.
    ///
    /// Ids, `created` and `pushed` from the caller are overwritten.
    fn stamp_event(event: &mut Event, now: Timestamp) {
        event.id = Uuid::new_v4().to_string();
        event.created = now;
        event.modified = now;
        event.pushed = 0;

        let device = event.device.clone();
        for reading in event.readings.get_or_insert_with(Vec::new) {
            Self::stamp_reading(reading, now);
            if reading.device.is_empty() {
                reading.device = device.clone();
            }
        }

        if event.checksum.is_empty() {
            event.checksum = event.compute_checksum();
        }
    }

    /// Give a new reading a fresh id and creation time.
    pub(crate) fn stamp_reading(reading: &mut Reading, now: Timestamp) {
        reading.id = Uuid::new_v4().to_string();
        reading.created = now;
        reading.modified = now;
        reading.pushed = 0;
    }
}

#[async_trait]
impl EventApi for CoreDataService {
    async fn add_event(
        &self,
        ctx: &RequestContext,
        mut event: Event,
    ) -> CoreDataResult<AddEventReceipt> {
        if self.notifier.is_closed() {
            return Err(CoreDataError::PipelineClosed);
        }

        self.check_device(ctx, &event.device).await?;

        if self.config.validate_value_descriptors {
            for reading in event.readings.iter().flatten() {
                self.require_descriptor(ctx, &reading.name).await?;
            }
        }

        Self::stamp_event(&mut event, self.now());
        metrics::record_event_ingested();

        if self.config.persist_data {
            query(ctx, self.store.add_event(&event)).await?;
            metrics::record_event_persisted();
            info!(
                event_id = %event.id,
                device = %event.device,
                readings = event.reading_count(),
                "Event persisted"
            );
        } else {
            debug!(event_id = %event.id, "Persistence disabled, event not stored");
        }

        let id = event.id.clone();
        let checksum = event.checksum.clone();
        let enqueued = self
            .notifier
            .enqueue(DomainSignal::EventCreated {
                correlation_id: ctx.correlation_id(),
                event,
            })
            .await;
        // Shutdown may close the queue after the event was stored.
        let notification = match enqueued {
            Err(CoreDataError::PipelineClosed) if self.config.persist_data => {
                metrics::record_signal_dropped();
                NotificationStatus::Dropped
            }
            other => other?,
        };

        if notification == NotificationStatus::Dropped {
            warn!(event_id = %id, "Event accepted without notification");
        }

        Ok(AddEventReceipt {
            id,
            checksum,
            notification,
        })
    }

    async fn event_by_id(&self, ctx: &RequestContext, id: &str) -> CoreDataResult<Event> {
        lookup(ctx, self.store.event_by_id(id), EntityKind::Event, id).await
    }

    async fn events(&self, ctx: &RequestContext, limit: usize) -> CoreDataResult<Vec<Event>> {
        self.check_limit(limit)?;
        query(ctx, self.store.events(limit)).await
    }

    async fn events_by_device(
        &self,
        ctx: &RequestContext,
        device: &str,
        limit: usize,
    ) -> CoreDataResult<Vec<Event>> {
        self.check_limit(limit)?;
        self.check_device(ctx, device).await?;
        query(ctx, self.store.events_for_device_limit(device, limit)).await
    }

    async fn events_by_creation_time(
        &self,
        ctx: &RequestContext,
        start: Timestamp,
        end: Timestamp,
        limit: usize,
    ) -> CoreDataResult<Vec<Event>> {
        self.check_limit(limit)?;
        query(ctx, self.store.events_by_creation_time(start, end, limit)).await
    }

    async fn event_count(&self, ctx: &RequestContext) -> CoreDataResult<usize> {
        query(ctx, self.store.event_count()).await
    }

    async fn event_count_by_device(
        &self,
        ctx: &RequestContext,
        device: &str,
    ) -> CoreDataResult<usize> {
        self.check_device(ctx, device).await?;
        query(ctx, self.store.event_count_by_device(device)).await
    }

    async fn update_event(&self, ctx: &RequestContext, patch: Event) -> CoreDataResult<()> {
        let existing = lookup(ctx, self.store.event_by_id(&patch.id), EntityKind::Event, &patch.id)
            .await?;

        if !patch.device.is_empty() && patch.device != existing.device {
            self.check_device(ctx, &patch.device).await?;
        }

        let mut merged = merge_event(&existing, &patch);
        merged.modified = self.now();
        lookup(
            ctx,
            self.store.update_event(&merged),
            EntityKind::Event,
            &merged.id,
        )
        .await?;

        debug!(event_id = %merged.id, "Event updated");
        Ok(())
    }

    async fn update_event_push_date(&self, ctx: &RequestContext, id: &str) -> CoreDataResult<()> {
        let mut event = lookup(ctx, self.store.event_by_id(id), EntityKind::Event, id).await?;

        let now = self.now();
        event.pushed = now;
        event.modified = now;
        lookup(ctx, self.store.update_event(&event), EntityKind::Event, id).await?;

        debug!(event_id = %id, pushed = now, "Event marked as pushed");
        Ok(())
    }

    async fn update_event_push_date_by_checksum(
        &self,
        ctx: &RequestContext,
        checksum: &str,
    ) -> CoreDataResult<usize> {
        let pending: Vec<Event> = query(ctx, self.store.events_by_checksum(checksum))
            .await?
            .into_iter()
            .filter(|e| !e.is_pushed())
            .collect();

        if pending.is_empty() {
            debug!(checksum, "No unpushed event with checksum");
            return Err(CoreDataError::not_found(EntityKind::Event, checksum));
        }

        let now = self.now();
        let mut marked = 0;
        for mut event in pending {
            event.pushed = now;
            event.modified = now;
            lookup(
                ctx,
                self.store.update_event(&event),
                EntityKind::Event,
                &event.id,
            )
            .await?;
            marked += 1;
        }

        debug!(checksum, marked, "Events marked as pushed by checksum");
        Ok(marked)
    }

    async fn delete_event_by_id(&self, ctx: &RequestContext, id: &str) -> CoreDataResult<()> {
        self.delete_event_cascade(ctx, id).await
    }

    async fn delete_events_by_device(
        &self,
        ctx: &RequestContext,
        device: &str,
    ) -> CoreDataResult<usize> {
        self.check_device(ctx, device).await?;
        self.delete_device_data(ctx, device).await
    }

    async fn delete_all_events(&self, ctx: &RequestContext) -> CoreDataResult<()> {
        let count = query(ctx, self.store.event_count()).await?;
        query(ctx, self.store.scrub_all_events()).await?;
        metrics::record_events_scrubbed("all", count);
        info!(events = count, "Deleted all events and readings");
        Ok(())
    }
}
