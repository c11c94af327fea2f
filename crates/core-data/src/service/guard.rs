//! Value-descriptor guard.
//!
//! The usage check is advisory: it samples a bounded page of readings and
//! takes no lock, so a reading written between the check and the delete is
//! not seen.

use super::CoreDataService;
use crate::context::RequestContext;
use crate::domain::is_valid_format;
use crate::error::{CoreDataError, CoreDataResult, StoreError};
use shared_types::ValueDescriptor;
use tracing::{error, warn};

impl CoreDataService {
    /// Check the descriptor's format string against the specifier grammar.
    pub(crate) fn check_format(&self, descriptor: &ValueDescriptor) -> CoreDataResult<()> {
        if is_valid_format(&descriptor.formatting) {
            return Ok(());
        }
        warn!(
            name = %descriptor.name,
            formatting = %descriptor.formatting,
            "Value descriptor's format string doesn't fit the required pattern"
        );
        Err(CoreDataError::InvalidFormat {
            name: descriptor.name.clone(),
        })
    }

    /// Fail with `ValueDescriptorMissing` unless a descriptor `name` exists.
    pub(crate) async fn require_descriptor(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> CoreDataResult<()> {
        match ctx.guard(self.store.value_descriptor_by_name(name)).await? {
            Ok(_) => Ok(()),
            Err(StoreError::NotFound) => {
                warn!(name, "Value descriptor for a reading not found");
                Err(CoreDataError::ValueDescriptorMissing {
                    name: name.to_string(),
                })
            }
            Err(err) => {
                error!(name, error = %err, "Error looking up value descriptor");
                Err(CoreDataError::Store(err))
            }
        }
    }

    /// Whether any reading references the descriptor `name`.
    pub(crate) async fn in_use(&self, ctx: &RequestContext, name: &str) -> CoreDataResult<bool> {
        let sample = ctx
            .guard(
                self.store
                    .readings_by_value_descriptor(name, self.config.usage_read_limit),
            )
            .await?;

        match sample {
            Ok(readings) => Ok(!readings.is_empty()),
            Err(StoreError::NotFound) => Ok(false),
            Err(err) => {
                error!(name, error = %err, "Error checking the readings for the value descriptor");
                Err(CoreDataError::Store(err))
            }
        }
    }

    /// Fail with `InUse` while readings reference the descriptor.
    pub(crate) async fn guard_delete(
        &self,
        ctx: &RequestContext,
        descriptor: &ValueDescriptor,
    ) -> CoreDataResult<()> {
        if self.in_use(ctx, &descriptor.name).await? {
            warn!(
                name = %descriptor.name,
                "Data integrity issue: value descriptor is still referenced by existing readings"
            );
            return Err(CoreDataError::InUse {
                name: descriptor.name.clone(),
            });
        }
        Ok(())
    }

    /// Fail with `InUse` if a rename would orphan readings of `old_name`.
    pub(crate) async fn guard_rename(
        &self,
        ctx: &RequestContext,
        old_name: &str,
        new_name: &str,
    ) -> CoreDataResult<()> {
        if old_name == new_name {
            return Ok(());
        }
        if self.in_use(ctx, old_name).await? {
            warn!(
                old_name,
                new_name,
                "Rename blocked: value descriptor is still referenced by existing readings"
            );
            return Err(CoreDataError::InUse {
                name: old_name.to_string(),
            });
        }
        Ok(())
    }
}
