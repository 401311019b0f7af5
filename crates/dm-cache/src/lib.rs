//! # dm-cache
//!
//! Redis plumbing for the messaging backend.
//!
//! The messaging service publishes realtime events on per-user channels
//! (`user:<id>`); every gateway instance pattern-subscribes to `user:*`
//! and forwards what it receives to its local connections.
//!
//! ## Example
//!
//! ```ignore
//! use dm_cache::{PubSubChannel, PubSubEvent, Publisher, RedisPool, RedisPoolConfig};
//! use dm_core::RealtimeEventKind;
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let publisher = Publisher::new(pool);
//!
//! let event = PubSubEvent::new(RealtimeEventKind::MessageNew, data);
//! publisher.publish(&PubSubChannel::user(recipient_id), &event).await?;
//! ```

pub mod pool;
pub mod pubsub;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult, SharedRedisPool};

// Re-export pubsub types
pub use pubsub::{
    PubSubChannel, PubSubEvent, Publisher, ReceivedMessage, Subscriber, SubscriberBuilder,
    SubscriberConfig, SubscriberError, SubscriberResult, USER_CHANNEL_PATTERN,
    USER_CHANNEL_PREFIX,
};
