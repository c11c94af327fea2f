//! # Message Publisher
//!
//! Defines the publishing side of the bus.

use crate::envelope::{BusMessage, MessageEnvelope};
use crate::error::BusError;
use crate::subscriber::{EnvelopeStream, Subscription, TopicFilter};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing envelopes to the bus.
///
/// A publish is fire-and-forget: success means the bus accepted the
/// message, nothing more.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish an envelope to a topic.
    ///
    /// # Returns
    ///
    /// The number of live subscribers the message was handed to.
    async fn publish(&self, topic: &str, envelope: MessageEnvelope) -> Result<usize, BusError>;

    /// Total number of publish attempts.
    fn messages_published(&self) -> u64;
}

/// In-memory implementation of the message bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer
/// semantics. Suitable for a single process; a broker-backed deployment
/// would provide a different `MessagePublisher`.
pub struct InMemoryMessageBus {
    /// Broadcast sender for messages.
    sender: broadcast::Sender<BusMessage>,

    /// Total publish attempts.
    messages_published: AtomicU64,

    /// Set once `close` is called; further publishes fail.
    closed: AtomicBool,

    /// Channel capacity.
    capacity: usize,
}

impl InMemoryMessageBus {
    /// Create a new in-memory bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            messages_published: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            capacity,
        }
    }

    /// Subscribe to messages matching a filter.
    ///
    /// Only messages published after this call are received.
    #[must_use]
    pub fn subscribe(&self, filter: TopicFilter) -> Subscription {
        debug!(topics = ?filter.topics, "New subscription created");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Get a stream of messages matching a filter.
    #[must_use]
    pub fn envelope_stream(&self, filter: TopicFilter) -> EnvelopeStream {
        EnvelopeStream::new(self.sender.subscribe(), filter)
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Refuse further publishes.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePublisher for InMemoryMessageBus {
    async fn publish(&self, topic: &str, envelope: MessageEnvelope) -> Result<usize, BusError> {
        // Always increment counter (message was attempted)
        self.messages_published.fetch_add(1, Ordering::Relaxed);

        if self.is_closed() {
            return Err(BusError::Closed);
        }

        let correlation_id = envelope.correlation_id;
        let message = BusMessage {
            topic: topic.to_string(),
            envelope,
        };

        match self.sender.send(message) {
            Ok(receiver_count) => {
                debug!(
                    topic = topic,
                    correlation_id = %correlation_id,
                    receivers = receiver_count,
                    "Message published"
                );
                Ok(receiver_count)
            }
            Err(_) => {
                // No receivers - best effort delivery means this is not an error
                warn!(
                    topic = topic,
                    correlation_id = %correlation_id,
                    "Message dropped (no receivers)"
                );
                Ok(0)
            }
        }
    }

    fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn envelope() -> MessageEnvelope {
        MessageEnvelope::json(Uuid::new_v4(), "", &"payload", 0).unwrap()
    }

    #[tokio::test]
    async fn test_publish_no_subscribers() {
        let bus = InMemoryMessageBus::new();

        let receivers = bus.publish("events", envelope()).await.unwrap();
        assert_eq!(receivers, 0);
        assert_eq!(bus.messages_published(), 1);
    }

    #[tokio::test]
    async fn test_publish_with_subscriber() {
        let bus = InMemoryMessageBus::new();

        // Create subscriber BEFORE publishing
        let _sub = bus.subscribe(TopicFilter::all());

        let receivers = bus.publish("events", envelope()).await.unwrap();

        assert_eq!(receivers, 1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = InMemoryMessageBus::new();

        let _sub1 = bus.subscribe(TopicFilter::all());
        let _sub2 = bus.subscribe(TopicFilter::all());
        let _sub3 = bus.subscribe(TopicFilter::topics(vec!["other".to_string()]));

        let receivers = bus.publish("events", envelope()).await.unwrap();

        // Filtering happens on the receiving side.
        assert_eq!(receivers, 3);
        assert_eq!(bus.subscriber_count(), 3);
    }

    #[tokio::test]
    async fn test_closed_bus_rejects_publish() {
        let bus = InMemoryMessageBus::new();
        bus.close();

        let result = bus.publish("events", envelope()).await;
        assert_eq!(result, Err(BusError::Closed));
        assert_eq!(bus.messages_published(), 1);
    }

    #[test]
    fn test_default_bus() {
        let bus = InMemoryMessageBus::default();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.messages_published(), 0);
        assert!(!bus.is_closed());
    }
}
