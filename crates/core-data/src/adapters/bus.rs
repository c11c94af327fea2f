//! Bus publisher adapter over `shared-bus`.

use crate::ports::outbound::BusPublisher;
use async_trait::async_trait;
use shared_bus::{BusError, MessageEnvelope, MessagePublisher};
use std::sync::Arc;
use tracing::trace;

/// Forwards envelopes to any `shared_bus::MessagePublisher`.
pub struct SharedBusPublisher<P: MessagePublisher> {
    bus: Arc<P>,
}

impl<P: MessagePublisher> SharedBusPublisher<P> {
    pub fn new(bus: Arc<P>) -> Self {
        Self { bus }
    }

    /// The wrapped bus.
    pub fn bus(&self) -> &Arc<P> {
        &self.bus
    }
}

#[async_trait]
impl<P: MessagePublisher + 'static> BusPublisher for SharedBusPublisher<P> {
    async fn publish(&self, topic: &str, envelope: MessageEnvelope) -> Result<(), BusError> {
        let receivers = self.bus.publish(topic, envelope).await?;
        trace!(topic, receivers, "Envelope handed to bus");
        Ok(())
    }
}
