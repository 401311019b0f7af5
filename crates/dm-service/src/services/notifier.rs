//! Realtime notification seam
//!
//! The service publishes events through a [`Notifier`] after a write has
//! been persisted. Delivery is best-effort: callers log failures and move on.

use async_trait::async_trait;
use dm_cache::{PubSubChannel, PubSubEvent, Publisher, RedisPoolError};
use dm_core::Snowflake;

/// Error raised while handing an event to the transport
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Redis publish failed: {0}")]
    Redis(#[from] RedisPoolError),

    #[error("Event could not be delivered: {0}")]
    Undeliverable(String),
}

/// Delivers an event to every live connection of one user
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: Snowflake, event: &PubSubEvent) -> Result<(), NotifyError>;
}

/// Publishes to the user's Redis channel for gateway processes to pick up
#[derive(Clone)]
pub struct RedisNotifier {
    publisher: Publisher,
}

impl RedisNotifier {
    pub fn new(publisher: Publisher) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl Notifier for RedisNotifier {
    async fn notify(&self, user_id: Snowflake, event: &PubSubEvent) -> Result<(), NotifyError> {
        self.publisher
            .publish(&PubSubChannel::user(user_id), event)
            .await?;
        Ok(())
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, user_id: Snowflake, event: &PubSubEvent) -> Result<(), NotifyError> {
        tracing::trace!(%user_id, event_type = %event.event_type, "Notification discarded");
        Ok(())
    }
}
