//! Retention scrubber: delete-by-age and delete-acknowledged sweeps.
//!
//! Both sweeps read the matching events first, then cascade-delete each one
//! through the integrity engine. Neither locks the store; they are safe to
//! run alongside ingestion and against each other.

use super::{query, CoreDataService};
use crate::context::RequestContext;
use crate::error::{CoreDataError, CoreDataResult};
use crate::metrics;
use crate::ports::inbound::RetentionApi;
use async_trait::async_trait;
use shared_types::Event;
use tracing::{debug, info};

impl CoreDataService {
    /// Cascade-delete `events`, counting those this sweep removed.
    ///
    /// An event that vanished since the query was removed by someone else
    /// and is not counted. Any other failure stops the sweep.
    async fn sweep(&self, ctx: &RequestContext, events: Vec<Event>) -> CoreDataResult<usize> {
        let mut removed = 0;
        for event in &events {
            match self.delete_event(ctx, event).await {
                Ok(()) => removed += 1,
                Err(CoreDataError::NotFound { .. }) => {
                    debug!(event_id = %event.id, "Event already removed");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl RetentionApi for CoreDataService {
    async fn scrub_by_age(&self, ctx: &RequestContext, age_millis: i64) -> CoreDataResult<usize> {
        let events = query(ctx, self.store.events_older_than_age(age_millis)).await?;
        debug!(age_millis, matched = events.len(), "Scrubbing events by age");

        let removed = self.sweep(ctx, events).await?;
        metrics::record_events_scrubbed("age", removed);
        info!(age_millis, removed, "Scrubbed old events");
        Ok(removed)
    }

    async fn scrub_pushed(&self, ctx: &RequestContext) -> CoreDataResult<usize> {
        let events = query(ctx, self.store.events_pushed()).await?;
        debug!(matched = events.len(), "Scrubbing pushed events");

        let removed = self.sweep(ctx, events).await?;
        metrics::record_events_scrubbed("pushed", removed);
        info!(removed, "Scrubbed pushed events");
        Ok(removed)
    }
}
