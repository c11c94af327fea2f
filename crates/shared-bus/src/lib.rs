//! # Shared Bus - Message Bus for Downstream Notification
//!
//! The message bus the core data service publishes to. Consumers subscribe
//! by topic; the publisher neither knows nor waits for them.
//!
//! ## Delivery Rules
//!
//! - Every message is a `MessageEnvelope` addressed to a topic.
//! - Delivery is best effort: a publish with no live subscriber succeeds and
//!   reaches nobody.
//! - A publish reports only local success or failure of the call itself;
//!   there is no downstream acknowledgment.
//!
//! ```text
//! ┌──────────────┐   publish(topic, envelope)   ┌──────────────┐
//! │  Core Data   │ ───────────────────────────→ │  Message Bus │
//! │ (one worker) │                              │              │
//! └──────────────┘                              └──────┬───────┘
//!                                                      │ subscribe(filter)
//!                                                      ↓
//!                                               ┌──────────────┐
//!                                               │  Consumers   │
//!                                               └──────────────┘
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod envelope;
pub mod error;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use envelope::{BusMessage, ContentType, MessageEnvelope};
pub use error::BusError;
pub use publisher::{InMemoryMessageBus, MessagePublisher};
pub use subscriber::{EnvelopeStream, Subscription, SubscriptionError, TopicFilter};

/// Current protocol version stamped on every envelope.
pub const PROTOCOL_VERSION: u16 = 1;

/// Maximum messages to buffer per subscriber before the slowest one lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
