//! Referential-integrity engine.
//!
//! The store only guarantees single-record atomicity, so cascading deletes
//! go child-first: readings, then the event. A crash part-way leaves orphan
//! readings, never an event pointing at deleted readings. Every step is a
//! delete-by-id, so re-running after a partial failure is safe.

use super::{lookup, query, CoreDataService};
use crate::context::RequestContext;
use crate::error::{CoreDataError, CoreDataResult, EntityKind, StoreError};
use shared_types::Event;
use tracing::{debug, error, info};

impl CoreDataService {
    /// Delete an event and the readings it owns.
    ///
    /// Each owned reading gets its own delete; one already gone is skipped.
    /// Any other reading failure aborts before the event is touched. When
    /// the event's reading collection is absent (not merely empty), every
    /// reading of its device is deleted instead.
    pub(crate) async fn delete_event(
        &self,
        ctx: &RequestContext,
        event: &Event,
    ) -> CoreDataResult<()> {
        match event.reading_ids() {
            Some(reading_ids) => {
                for reading_id in &reading_ids {
                    let outcome = ctx
                        .guard(self.store.delete_reading_by_id(reading_id))
                        .await?;
                    match outcome {
                        Ok(()) => {}
                        Err(StoreError::NotFound) => {
                            debug!(
                                event_id = %event.id,
                                reading_id = %reading_id,
                                "Reading already removed"
                            );
                        }
                        Err(err) => {
                            error!(
                                event_id = %event.id,
                                reading_id = %reading_id,
                                error = %err,
                                "Reading delete failed, event kept"
                            );
                            return Err(CoreDataError::from_store(
                                err,
                                EntityKind::Reading,
                                reading_id,
                            ));
                        }
                    }
                }
            }
            None => {
                let removed = query(ctx, self.store.delete_readings_by_device(&event.device)).await?;
                debug!(
                    event_id = %event.id,
                    device = %event.device,
                    removed,
                    "Reading collection absent, deleted readings by device"
                );
            }
        }

        lookup(
            ctx,
            self.store.delete_event_by_id(&event.id),
            EntityKind::Event,
            &event.id,
        )
        .await
    }

    /// Resolve `id` and cascade-delete the event.
    pub(crate) async fn delete_event_cascade(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> CoreDataResult<()> {
        let event = lookup(ctx, self.store.event_by_id(id), EntityKind::Event, id).await?;
        self.delete_event(ctx, &event).await?;
        debug!(event_id = %id, readings = event.reading_count(), "Event deleted");
        Ok(())
    }

    /// Bulk-delete a device's readings, then its events.
    pub(crate) async fn delete_device_data(
        &self,
        ctx: &RequestContext,
        device: &str,
    ) -> CoreDataResult<usize> {
        let readings = query(ctx, self.store.delete_readings_by_device(device)).await?;
        let events = query(ctx, self.store.delete_events_by_device(device)).await?;
        info!(device, events, readings, "Deleted device data");
        Ok(events)
    }
}
