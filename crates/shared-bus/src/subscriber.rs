//! # Message Subscriber
//!
//! Defines the subscription side of the bus.

use crate::envelope::BusMessage;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("Message bus closed")]
    Closed,
}

/// Filter for subscribing to specific topics.
#[derive(Debug, Clone, Default)]
pub struct TopicFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<String>,
}

impl TopicFilter {
    /// Create a filter that accepts every topic.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<String>) -> Self {
        Self { topics }
    }

    /// Check if a topic matches this filter.
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        self.topics.is_empty() || self.topics.iter().any(|t| t == topic)
    }
}

/// A topic-filtered receiver. Sees only messages published after it was
/// created; dropping it unsubscribes.
pub struct Subscription {
    receiver: broadcast::Receiver<BusMessage>,
    filter: TopicFilter,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<BusMessage>, filter: TopicFilter) -> Self {
        Self { receiver, filter }
    }

    /// Next matching message. `None` once the bus is gone.
    ///
    /// Messages missed because this subscriber lagged are skipped.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if self.filter.matches(&message.topic) => return Some(message),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Subscriber fell behind the bus");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching message if one is already buffered.
    pub fn try_recv(&mut self) -> Result<Option<BusMessage>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) if self.filter.matches(&message.topic) => return Ok(Some(message)),
                Ok(_) | Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }
}

/// A filtered stream of bus messages.
///
/// Implements `tokio_stream::Stream` for use with stream combinators.
pub struct EnvelopeStream {
    inner: BroadcastStream<BusMessage>,
    filter: TopicFilter,
}

impl EnvelopeStream {
    pub(crate) fn new(receiver: broadcast::Receiver<BusMessage>, filter: TopicFilter) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
            filter,
        }
    }

    /// Get the filter for this stream.
    #[must_use]
    pub fn filter(&self) -> &TopicFilter {
        &self.filter
    }
}

impl Stream for EnvelopeStream {
    type Item = BusMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(message))) => {
                    if self.filter.matches(&message.topic) {
                        return Poll::Ready(Some(message));
                    }
                }
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(count)))) => {
                    debug!(lagged = count, "Stream lagged, some messages dropped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::MessageEnvelope;
    use crate::publisher::{InMemoryMessageBus, MessagePublisher};
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;
    use uuid::Uuid;

    fn envelope(body: &str) -> MessageEnvelope {
        MessageEnvelope::json(Uuid::new_v4(), "", &body, 0).unwrap()
    }

    #[tokio::test]
    async fn test_subscription_recv() {
        let bus = InMemoryMessageBus::new();
        let mut sub = bus.subscribe(TopicFilter::all());

        bus.publish("events", envelope("first")).await.unwrap();

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("message");

        assert_eq!(received.topic, "events");
        let body: String = received.envelope.decode_json().unwrap();
        assert_eq!(body, "first");
    }

    #[tokio::test]
    async fn test_subscription_filter() {
        let bus = InMemoryMessageBus::new();
        let mut sub = bus.subscribe(TopicFilter::topics(vec!["events".to_string()]));

        bus.publish("readings", envelope("skip")).await.unwrap();
        bus.publish("events", envelope("keep")).await.unwrap();

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("message");

        let body: String = received.envelope.decode_json().unwrap();
        assert_eq!(body, "keep");
    }

    #[tokio::test]
    async fn test_dropped_subscription_receives_nothing() {
        let bus = InMemoryMessageBus::new();
        let sub = bus.subscribe(TopicFilter::topics(vec!["events".to_string()]));
        drop(sub);

        let receivers = bus.publish("events", envelope("lost")).await.unwrap();
        assert_eq!(receivers, 0);
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = InMemoryMessageBus::new();
        let mut sub = bus.subscribe(TopicFilter::all());

        assert!(matches!(sub.try_recv(), Ok(None)));
    }

    #[tokio::test]
    async fn test_stream_preserves_order() {
        let bus = InMemoryMessageBus::new();
        let mut stream = bus.envelope_stream(TopicFilter::topics(vec!["events".to_string()]));

        for body in ["a", "b", "c"] {
            bus.publish("events", envelope(body)).await.unwrap();
        }

        let mut bodies = Vec::new();
        for _ in 0..3 {
            let message = timeout(Duration::from_millis(100), stream.next())
                .await
                .expect("timeout")
                .expect("message");
            bodies.push(message.envelope.decode_json::<String>().unwrap());
        }

        assert_eq!(bodies, vec!["a", "b", "c"]);
        assert_eq!(EnvelopeStream::filter(&stream).topics, vec!["events".to_string()]);
    }
}
