//! Event dispatcher
//!
//! Receives events published on per-user Redis channels and forwards them
//! to this process's connections of that user.

use crate::connection::ConnectionManager;
use crate::protocol::GatewayMessage;
use dm_cache::{
    PubSubChannel, PubSubEvent, ReceivedMessage, Subscriber, SubscriberBuilder, SubscriberError,
    USER_CHANNEL_PATTERN,
};
use dm_core::Snowflake;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct EventDispatcherConfig {
    pub redis_url: String,
    /// Capacity of the in-process fan-out channel
    pub broadcast_buffer: usize,
    pub reconnect_delay_ms: u64,
}

impl Default for EventDispatcherConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broadcast_buffer: 1024,
            reconnect_delay_ms: 1000,
        }
    }
}

/// Routes Redis Pub/Sub messages to WebSocket connections
pub struct EventDispatcher {
    connection_manager: Arc<ConnectionManager>,
    subscriber: Subscriber,
    running: Arc<AtomicBool>,
}

impl EventDispatcher {
    /// Connect to Redis and subscribe to every user channel
    pub async fn new(
        config: EventDispatcherConfig,
        connection_manager: Arc<ConnectionManager>,
    ) -> Result<Self, SubscriberError> {
        let subscriber = SubscriberBuilder::new()
            .redis_url(&config.redis_url)
            .broadcast_buffer(config.broadcast_buffer)
            .reconnect_delay_ms(config.reconnect_delay_ms)
            .psubscribe(USER_CHANNEL_PATTERN)
            .build()
            .await?;

        Ok(Self {
            connection_manager,
            subscriber,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Spawn the forwarding loop
    pub fn start(self: Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Event dispatcher is already running");
            return;
        }

        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.run().await;
        });

        tracing::info!(pattern = USER_CHANNEL_PATTERN, "Event dispatcher started");
    }

    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.subscriber.shutdown().await.ok();
        tracing::info!("Event dispatcher stopped");
    }

    async fn run(&self) {
        let mut receiver = self.subscriber.receiver();

        while self.running.load(Ordering::SeqCst) {
            match receiver.recv().await {
                Ok(msg) => {
                    forward(&self.connection_manager, &msg);
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "Event dispatcher lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::warn!("Event dispatcher channel closed");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Event dispatcher loop ended");
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Deliver one received message to the local connections of its user
///
/// Returns how many connections accepted the frame.
pub(crate) fn forward(manager: &ConnectionManager, msg: &ReceivedMessage) -> usize {
    let Some(event) = &msg.event else {
        tracing::debug!(channel = ?msg.channel, "Received non-event message, ignoring");
        return 0;
    };

    let &PubSubChannel::User(user_id) = &msg.channel else {
        tracing::debug!(
            channel = ?msg.channel,
            event_type = %event.event_type,
            "Event on non-user channel, ignoring"
        );
        return 0;
    };

    forward_event(manager, user_id, event)
}

/// Deliver one event to the local connections of `user_id`
pub(crate) fn forward_event(
    manager: &ConnectionManager,
    user_id: Snowflake,
    event: &PubSubEvent,
) -> usize {
    let frame = GatewayMessage::dispatch(event.event_type.as_str(), event.data.clone());
    let sent = manager.send_to_user(user_id, &frame);

    tracing::trace!(
        user_id = %user_id,
        event_type = %event.event_type,
        sent = sent,
        "Event dispatched to user"
    );

    sent
}
