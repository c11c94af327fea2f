//! Reading operations.

use super::{lookup, query, CoreDataService};
use crate::context::RequestContext;
use crate::domain::merge_reading;
use crate::error::{CoreDataResult, EntityKind};
use crate::ports::inbound::ReadingApi;
use async_trait::async_trait;
use shared_types::{Reading, Timestamp, ValueDescriptor};
use tracing::debug;

impl CoreDataService {
    /// Readings of every descriptor in `descriptors`.
    async fn readings_of_descriptors(
        &self,
        ctx: &RequestContext,
        descriptors: Vec<ValueDescriptor>,
        limit: usize,
    ) -> CoreDataResult<Vec<Reading>> {
        let names: Vec<String> = descriptors.into_iter().map(|vd| vd.name).collect();
        if names.is_empty() {
            return Ok(Vec::new());
        }
        query(ctx, self.store.readings_by_value_descriptor_names(&names, limit)).await
    }

    async fn check_descriptor(&self, ctx: &RequestContext, name: &str) -> CoreDataResult<()> {
        if self.config.validate_value_descriptors {
            self.require_descriptor(ctx, name).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ReadingApi for CoreDataService {
    async fn add_reading(&self, ctx: &RequestContext, mut reading: Reading) -> CoreDataResult<String> {
        if !reading.device.is_empty() {
            self.check_device(ctx, &reading.device).await?;
        }
        self.check_descriptor(ctx, &reading.name).await?;

        Self::stamp_reading(&mut reading, self.now());

        if self.config.persist_data {
            query(ctx, self.store.add_reading(&reading)).await?;
            debug!(reading_id = %reading.id, name = %reading.name, "Reading persisted");
        }

        Ok(reading.id)
    }

    async fn reading_by_id(&self, ctx: &RequestContext, id: &str) -> CoreDataResult<Reading> {
        lookup(ctx, self.store.reading_by_id(id), EntityKind::Reading, id).await
    }

    async fn readings(&self, ctx: &RequestContext, limit: usize) -> CoreDataResult<Vec<Reading>> {
        self.check_limit(limit)?;
        query(ctx, self.store.readings(limit)).await
    }

    async fn update_reading(&self, ctx: &RequestContext, patch: Reading) -> CoreDataResult<()> {
        let existing = lookup(
            ctx,
            self.store.reading_by_id(&patch.id),
            EntityKind::Reading,
            &patch.id,
        )
        .await?;

        if !patch.name.is_empty() {
            self.check_descriptor(ctx, &patch.name).await?;
        }

        let mut merged = merge_reading(&existing, &patch);
        merged.modified = self.now();
        lookup(
            ctx,
            self.store.update_reading(&merged),
            EntityKind::Reading,
            &merged.id,
        )
        .await
    }

    async fn delete_reading_by_id(&self, ctx: &RequestContext, id: &str) -> CoreDataResult<()> {
        lookup(ctx, self.store.delete_reading_by_id(id), EntityKind::Reading, id).await?;
        debug!(reading_id = %id, "Reading deleted");
        Ok(())
    }

    async fn reading_count(&self, ctx: &RequestContext) -> CoreDataResult<usize> {
        query(ctx, self.store.reading_count()).await
    }

    async fn readings_by_device(
        &self,
        ctx: &RequestContext,
        device: &str,
        limit: usize,
    ) -> CoreDataResult<Vec<Reading>> {
        self.check_limit(limit)?;
        self.check_device(ctx, device).await?;
        query(ctx, self.store.readings_by_device(device, limit)).await
    }

    async fn readings_by_value_descriptor(
        &self,
        ctx: &RequestContext,
        name: &str,
        limit: usize,
    ) -> CoreDataResult<Vec<Reading>> {
        self.check_limit(limit)?;
        self.check_descriptor(ctx, name).await?;
        query(ctx, self.store.readings_by_value_descriptor(name, limit)).await
    }

    async fn readings_by_device_and_value_descriptor(
        &self,
        ctx: &RequestContext,
        device: &str,
        name: &str,
        limit: usize,
    ) -> CoreDataResult<Vec<Reading>> {
        self.check_limit(limit)?;
        self.check_device(ctx, device).await?;
        self.check_descriptor(ctx, name).await?;
        query(
            ctx,
            self.store
                .readings_by_device_and_value_descriptor(device, name, limit),
        )
        .await
    }

    async fn readings_by_uom_label(
        &self,
        ctx: &RequestContext,
        uom_label: &str,
        limit: usize,
    ) -> CoreDataResult<Vec<Reading>> {
        self.check_limit(limit)?;
        let descriptors = query(ctx, self.store.value_descriptors_by_uom_label(uom_label)).await?;
        self.readings_of_descriptors(ctx, descriptors, limit).await
    }

    async fn readings_by_label(
        &self,
        ctx: &RequestContext,
        label: &str,
        limit: usize,
    ) -> CoreDataResult<Vec<Reading>> {
        self.check_limit(limit)?;
        let descriptors = query(ctx, self.store.value_descriptors_by_label(label)).await?;
        self.readings_of_descriptors(ctx, descriptors, limit).await
    }

    async fn readings_by_type(
        &self,
        ctx: &RequestContext,
        value_type: &str,
        limit: usize,
    ) -> CoreDataResult<Vec<Reading>> {
        self.check_limit(limit)?;
        let descriptors = query(ctx, self.store.value_descriptors_by_type(value_type)).await?;
        self.readings_of_descriptors(ctx, descriptors, limit).await
    }

    async fn readings_by_creation_time(
        &self,
        ctx: &RequestContext,
        start: Timestamp,
        end: Timestamp,
        limit: usize,
    ) -> CoreDataResult<Vec<Reading>> {
        self.check_limit(limit)?;
        query(ctx, self.store.readings_by_creation_time(start, end, limit)).await
    }
}
