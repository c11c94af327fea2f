//! Value descriptor operations.

use super::{lookup, query, CoreDataService};
use crate::context::RequestContext;
use crate::domain::{merge_value_descriptor, renames};
use crate::error::{CoreDataError, CoreDataResult, EntityKind, StoreError};
use crate::ports::inbound::{DescriptorUsage, ValueDescriptorApi};
use crate::ports::outbound::DeviceRef;
use async_trait::async_trait;
use shared_types::ValueDescriptor;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Translate a failed descriptor write.
fn write_error(err: StoreError, descriptor: &ValueDescriptor) -> CoreDataError {
    match err {
        StoreError::NotUnique => {
            warn!(name = %descriptor.name, "Value descriptor name is not unique");
            CoreDataError::DuplicateName {
                name: descriptor.name.clone(),
            }
        }
        other => {
            let err = CoreDataError::from_store(other, EntityKind::ValueDescriptor, &descriptor.id);
            if let CoreDataError::Store(inner) = &err {
                error!(name = %descriptor.name, error = %inner, "Value descriptor write failed");
            }
            err
        }
    }
}

impl CoreDataService {
    /// Look up each name, skipping names with no descriptor.
    async fn descriptors_named(
        &self,
        ctx: &RequestContext,
        names: &[String],
    ) -> CoreDataResult<Vec<ValueDescriptor>> {
        let mut found = Vec::with_capacity(names.len());
        for name in names {
            match ctx.guard(self.store.value_descriptor_by_name(name)).await? {
                Ok(descriptor) => found.push(descriptor),
                Err(StoreError::NotFound) => {
                    debug!(name = %name, "Value descriptor not found, skipped");
                }
                Err(err) => {
                    error!(name = %name, error = %err, "Value descriptor lookup failed");
                    return Err(CoreDataError::Store(err));
                }
            }
        }
        Ok(found)
    }

    /// Every descriptor, refused when there are more than the query maximum.
    async fn all_descriptors(&self, ctx: &RequestContext) -> CoreDataResult<Vec<ValueDescriptor>> {
        let all = query(ctx, self.store.value_descriptors()).await?;
        self.check_limit(all.len())?;
        Ok(all)
    }
}

#[async_trait]
impl ValueDescriptorApi for CoreDataService {
    async fn add_value_descriptor(
        &self,
        ctx: &RequestContext,
        mut descriptor: ValueDescriptor,
    ) -> CoreDataResult<String> {
        self.check_format(&descriptor)?;

        let now = self.now();
        if descriptor.id.is_empty() {
            descriptor.id = Uuid::new_v4().to_string();
        }
        if descriptor.created == 0 {
            descriptor.created = now;
        }
        descriptor.modified = now;

        ctx.guard(self.store.add_value_descriptor(&descriptor))
            .await?
            .map_err(|err| write_error(err, &descriptor))?;

        info!(id = %descriptor.id, name = %descriptor.name, "Value descriptor added");
        Ok(descriptor.id)
    }

    async fn value_descriptor_by_id(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> CoreDataResult<ValueDescriptor> {
        lookup(
            ctx,
            self.store.value_descriptor_by_id(id),
            EntityKind::ValueDescriptor,
            id,
        )
        .await
    }

    async fn value_descriptor_by_name(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> CoreDataResult<ValueDescriptor> {
        lookup(
            ctx,
            self.store.value_descriptor_by_name(name),
            EntityKind::ValueDescriptor,
            name,
        )
        .await
    }

    async fn value_descriptors(&self, ctx: &RequestContext) -> CoreDataResult<Vec<ValueDescriptor>> {
        self.all_descriptors(ctx).await
    }

    async fn value_descriptors_by_label(
        &self,
        ctx: &RequestContext,
        label: &str,
    ) -> CoreDataResult<Vec<ValueDescriptor>> {
        query(ctx, self.store.value_descriptors_by_label(label)).await
    }

    async fn value_descriptors_by_uom_label(
        &self,
        ctx: &RequestContext,
        uom_label: &str,
    ) -> CoreDataResult<Vec<ValueDescriptor>> {
        query(ctx, self.store.value_descriptors_by_uom_label(uom_label)).await
    }

    async fn value_descriptors_by_type(
        &self,
        ctx: &RequestContext,
        value_type: &str,
    ) -> CoreDataResult<Vec<ValueDescriptor>> {
        query(ctx, self.store.value_descriptors_by_type(value_type)).await
    }

    async fn value_descriptors_by_device(
        &self,
        ctx: &RequestContext,
        device: &DeviceRef,
    ) -> CoreDataResult<Vec<ValueDescriptor>> {
        let info = ctx.guard(self.resolver.device(device)).await?.map_err(|err| {
            warn!(device = %device, error = %err, "Problem getting device from the registry");
            CoreDataError::from(err)
        })?;

        self.descriptors_named(ctx, &info.value_descriptor_names)
            .await
    }

    async fn update_value_descriptor(
        &self,
        ctx: &RequestContext,
        patch: ValueDescriptor,
    ) -> CoreDataResult<()> {
        let existing = lookup(
            ctx,
            self.store.value_descriptor_by_id(&patch.id),
            EntityKind::ValueDescriptor,
            &patch.id,
        )
        .await?;

        let mut merged = merge_value_descriptor(&existing, &patch);
        if !patch.formatting.is_empty() {
            self.check_format(&merged)?;
        }
        if renames(&existing, &patch) {
            self.guard_rename(ctx, &existing.name, &patch.name).await?;
        }

        merged.modified = self.now();
        ctx.guard(self.store.update_value_descriptor(&merged))
            .await?
            .map_err(|err| write_error(err, &merged))?;

        info!(id = %merged.id, name = %merged.name, "Value descriptor updated");
        Ok(())
    }

    async fn delete_value_descriptor_by_id(
        &self,
        ctx: &RequestContext,
        id: &str,
    ) -> CoreDataResult<()> {
        let descriptor = self.value_descriptor_by_id(ctx, id).await?;
        self.guard_delete(ctx, &descriptor).await?;
        lookup(
            ctx,
            self.store.delete_value_descriptor_by_id(&descriptor.id),
            EntityKind::ValueDescriptor,
            &descriptor.id,
        )
        .await?;

        info!(id = %descriptor.id, name = %descriptor.name, "Value descriptor deleted");
        Ok(())
    }

    async fn delete_value_descriptor_by_name(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> CoreDataResult<()> {
        let descriptor = self.value_descriptor_by_name(ctx, name).await?;
        self.guard_delete(ctx, &descriptor).await?;
        lookup(
            ctx,
            self.store.delete_value_descriptor_by_id(&descriptor.id),
            EntityKind::ValueDescriptor,
            &descriptor.id,
        )
        .await?;

        info!(id = %descriptor.id, name, "Value descriptor deleted");
        Ok(())
    }

    async fn value_descriptor_usage(
        &self,
        ctx: &RequestContext,
        names: Option<Vec<String>>,
    ) -> CoreDataResult<Vec<DescriptorUsage>> {
        let descriptors = match names {
            Some(names) => self.descriptors_named(ctx, &names).await?,
            None => self.all_descriptors(ctx).await?,
        };

        let mut usage = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let in_use = self.in_use(ctx, &descriptor.name).await?;
            usage.push(DescriptorUsage {
                name: descriptor.name,
                in_use,
            });
        }
        Ok(usage)
    }

    fn validate_format_string(&self, descriptor: &ValueDescriptor) -> CoreDataResult<()> {
        self.check_format(descriptor)
    }
}
