//! # Node Runtime
//!
//! Wires the service to its adapters and owns the background tasks.
//!
//! ## Startup Sequence
//!
//! 1. Build the static device registry from configuration
//! 2. Start the notification worker on the message bus
//! 3. Build the service around the worker's sender
//! 4. Start the retention ticker (if configured)
//!
//! ## Shutdown Sequence
//!
//! 1. Cancel the ticker and any in-flight scrub
//! 2. Drain the notification queue and join the worker
//! 3. Close the bus

use crate::config::NodeConfig;
use crate::retention::spawn_ticker;
use core_data::adapters::{
    InMemoryDataStore, SharedBusPublisher, StaticDeviceResolver, SystemTimeSource,
};
use core_data::{
    CoreDataDependencies, CoreDataService, NotificationPipeline, PipelineHandle, PipelineReport,
    RetentionApi, TimeSource,
};
use shared_bus::InMemoryMessageBus;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// A running core data node.
pub struct CoreDataNode {
    service: Arc<CoreDataService>,
    bus: Arc<InMemoryMessageBus>,
    pipeline: PipelineHandle,
    ticker: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl CoreDataNode {
    /// Start a node on the wall clock.
    pub fn start(config: NodeConfig) -> Self {
        Self::start_with_clock(config, Arc::new(SystemTimeSource))
    }

    /// Start a node on a caller-supplied clock.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start_with_clock(config: NodeConfig, clock: Arc<dyn TimeSource>) -> Self {
        let resolver = StaticDeviceResolver::new();
        for device in &config.devices {
            info!(device = %device.name, id = %device.id, "Registering device");
            resolver.register(device.clone());
        }

        let bus = Arc::new(InMemoryMessageBus::new());
        let pipeline = NotificationPipeline::from_config(&config.service);
        let notifier = pipeline.sender();
        let pipeline = pipeline.start(Arc::new(SharedBusPublisher::new(bus.clone())), clock.clone());

        let deps = CoreDataDependencies {
            store: Arc::new(InMemoryDataStore::new(clock.clone())),
            resolver: Arc::new(resolver),
            notifier,
            clock,
        };
        let service = Arc::new(CoreDataService::new(deps, config.service.clone()));

        let shutdown = CancellationToken::new();
        let retention: Arc<dyn RetentionApi> = service.clone();
        let ticker = spawn_ticker(retention, config.retention.clone(), shutdown.clone());

        info!(
            persist = config.service.persist_data,
            validate_descriptors = config.service.validate_value_descriptors,
            meta_data_check = config.service.meta_data_check,
            topic = %config.service.publish_topic,
            devices = config.devices.len(),
            "Core data node started"
        );

        Self {
            service,
            bus,
            pipeline,
            ticker,
            shutdown,
        }
    }

    /// The service, for embedding a transport in front of it.
    #[must_use]
    pub fn service(&self) -> Arc<CoreDataService> {
        Arc::clone(&self.service)
    }

    /// The bus notifications are published on.
    #[must_use]
    pub fn bus(&self) -> Arc<InMemoryMessageBus> {
        Arc::clone(&self.bus)
    }

    /// Stop the ticker, drain the notification queue and close the bus.
    pub async fn shutdown(self) -> PipelineReport {
        info!("Initiating graceful shutdown...");
        self.shutdown.cancel();

        if let Some(ticker) = self.ticker {
            if let Err(err) = ticker.await {
                error!(error = %err, "Retention ticker terminated abnormally");
            }
        }

        let report = self.pipeline.shutdown().await;
        self.bus.close();

        info!(
            published = report.published,
            failed = report.failed,
            "Shutdown complete"
        );
        report
    }
}
