//! Redis Pub/Sub module.
//!
//! Per-user channels carry realtime events between API and gateway instances.

mod channels;
mod publisher;
mod subscriber;

pub use channels::{PubSubChannel, USER_CHANNEL_PATTERN, USER_CHANNEL_PREFIX};
pub use publisher::{PubSubEvent, Publisher};
pub use subscriber::{
    ReceivedMessage, Subscriber, SubscriberBuilder, SubscriberConfig, SubscriberError,
    SubscriberResult,
};
