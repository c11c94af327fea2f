//! # Core Data Service
//!
//! The service implementing the inbound API.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `EventApi`, `ReadingApi`, `ValueDescriptorApi` and `RetentionApi`
//! 2. Guards value descriptors against deletion or rename while in use
//! 3. Deletes events child-first over a store without multi-record atomicity
//! 4. Hands every ingested event to the notification pipeline
//! 5. Takes every external dependency by injection
//!
//! No entity is cached: every read goes to the store.

mod events;
mod guard;
mod integrity;
mod readings;
mod retention;
mod value_descriptors;

use crate::config::CoreDataConfig;
use crate::context::RequestContext;
use crate::error::{CoreDataError, CoreDataResult, EntityKind, ResolverError, StoreResult};
use crate::pipeline::NotificationSender;
use crate::ports::outbound::{DataStore, DeviceRef, DeviceResolver, TimeSource};
use shared_types::{DeviceInfo, Timestamp};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Dependencies for `CoreDataService`
pub struct CoreDataDependencies {
    pub store: Arc<dyn DataStore>,
    pub resolver: Arc<dyn DeviceResolver>,
    pub notifier: NotificationSender,
    pub clock: Arc<dyn TimeSource>,
}

/// The Core Data Service.
pub struct CoreDataService {
    /// Document store.
    pub(crate) store: Arc<dyn DataStore>,
    /// Device registry client.
    pub(crate) resolver: Arc<dyn DeviceResolver>,
    /// Ingestion side of the notification pipeline.
    pub(crate) notifier: NotificationSender,
    /// Time source for created/modified/pushed stamps.
    pub(crate) clock: Arc<dyn TimeSource>,
    /// Service configuration.
    pub(crate) config: CoreDataConfig,
}

impl CoreDataService {
    /// Create a new service with the given dependencies.
    pub fn new(deps: CoreDataDependencies, config: CoreDataConfig) -> Self {
        Self {
            store: deps.store,
            resolver: deps.resolver,
            notifier: deps.notifier,
            clock: deps.clock,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CoreDataConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.clock.now_millis()
    }

    /// Reject a query limit above the configured maximum.
    pub(crate) fn check_limit(&self, limit: usize) -> CoreDataResult<()> {
        if limit > self.config.max_result_count {
            warn!(
                requested = limit,
                max = self.config.max_result_count,
                "Query limit exceeded"
            );
            return Err(CoreDataError::LimitExceeded {
                requested: limit,
                max: self.config.max_result_count,
            });
        }
        Ok(())
    }

    /// Resolve a device given by name or id: name first, then id.
    pub(crate) async fn resolve_device(
        &self,
        ctx: &RequestContext,
        device: &str,
    ) -> CoreDataResult<DeviceInfo> {
        let by_name = ctx
            .guard(self.resolver.device(&DeviceRef::Name(device.to_string())))
            .await?;

        let result = match by_name {
            Err(ResolverError::NotFound { .. }) => {
                ctx.guard(self.resolver.device(&DeviceRef::Id(device.to_string())))
                    .await?
            }
            other => other,
        };

        result.map_err(|err| {
            warn!(device, error = %err, "Device check failed");
            CoreDataError::from(err)
        })
    }

    /// Resolve the device only when the metadata check is enabled.
    pub(crate) async fn check_device(&self, ctx: &RequestContext, device: &str) -> CoreDataResult<()> {
        if self.config.meta_data_check {
            self.resolve_device(ctx, device).await?;
        }
        Ok(())
    }
}

/// Run a store query; any failure passes through as `CoreDataError::Store`.
pub(crate) async fn query<T, F>(ctx: &RequestContext, fut: F) -> CoreDataResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match ctx.guard(fut).await? {
        Ok(value) => Ok(value),
        Err(err) => {
            error!(
                correlation_id = %ctx.correlation_id(),
                error = %err,
                "Store query failed"
            );
            Err(CoreDataError::Store(err))
        }
    }
}

/// Run a store call addressing one entity; "not found" becomes `NotFound`.
pub(crate) async fn lookup<T, F>(
    ctx: &RequestContext,
    fut: F,
    entity: EntityKind,
    key: &str,
) -> CoreDataResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match ctx.guard(fut).await? {
        Ok(value) => Ok(value),
        Err(err) => {
            let err = CoreDataError::from_store(err, entity, key);
            if let CoreDataError::Store(inner) = &err {
                error!(%entity, key, error = %inner, "Store operation failed");
            } else {
                debug!(%entity, key, error = %err, "Lookup failed");
            }
            Err(err)
        }
    }
}
