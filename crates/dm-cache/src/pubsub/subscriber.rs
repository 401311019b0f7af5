//! Redis Pub/Sub subscriber.
//!
//! Listens on glob patterns and fans received events out to in-process
//! receivers. Reconnects and re-subscribes after a Redis error.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::StreamExt;
use redis::Client;
use tokio::sync::{broadcast, mpsc, RwLock};

use crate::pubsub::{PubSubChannel, PubSubEvent};

/// Error type for subscriber operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Failed to parse event: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Channel closed")]
    ChannelClosed,
}

/// Result type for subscriber operations
pub type SubscriberResult<T> = Result<T, SubscriberError>;

/// Received message from Pub/Sub
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Concrete channel the message was published on
    pub channel: PubSubChannel,
    /// Parsed event (if valid JSON)
    pub event: Option<PubSubEvent>,
    /// Raw payload
    pub payload: String,
}

impl ReceivedMessage {
    /// Create from raw Redis message
    pub fn from_redis(channel_name: &str, payload: String) -> Self {
        let channel = PubSubChannel::parse(channel_name);
        let event = serde_json::from_str(&payload).ok();

        Self {
            channel,
            event,
            payload,
        }
    }
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Channel buffer size for broadcast
    pub broadcast_buffer: usize,
    /// Reconnection delay in milliseconds
    pub reconnect_delay_ms: u64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broadcast_buffer: 1024,
            reconnect_delay_ms: 1000,
        }
    }
}

#[derive(Debug)]
enum SubscriberCommand {
    PSubscribe(Vec<String>),
    Shutdown,
}

/// Redis Pub/Sub subscriber
///
/// Patterns are replayed after every reconnect.
pub struct Subscriber {
    broadcast_tx: broadcast::Sender<ReceivedMessage>,
    control_tx: mpsc::Sender<SubscriberCommand>,
}

impl Subscriber {
    /// Create a new subscriber and start the background listener
    pub fn new(config: SubscriberConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_buffer);
        let (control_tx, control_rx) = mpsc::channel(32);

        tokio::spawn(Self::listener_loop(
            config,
            Arc::new(RwLock::new(HashSet::new())),
            broadcast_tx.clone(),
            control_rx,
        ));

        Self {
            broadcast_tx,
            control_tx,
        }
    }

    async fn listener_loop(
        config: SubscriberConfig,
        patterns: Arc<RwLock<HashSet<String>>>,
        broadcast_tx: broadcast::Sender<ReceivedMessage>,
        mut control_rx: mpsc::Receiver<SubscriberCommand>,
    ) {
        loop {
            match Self::run_listener(&config, &patterns, &broadcast_tx, &mut control_rx).await {
                Ok(true) => {
                    tracing::info!("Subscriber shutting down");
                    break;
                }
                Ok(false) => {
                    tokio::time::sleep(tokio::time::Duration::from_millis(
                        config.reconnect_delay_ms,
                    ))
                    .await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Subscriber error, reconnecting...");
                    tokio::time::sleep(tokio::time::Duration::from_millis(
                        config.reconnect_delay_ms,
                    ))
                    .await;
                }
            }
        }
    }

    /// Run the listener until error or shutdown; `Ok(true)` means stop
    async fn run_listener(
        config: &SubscriberConfig,
        patterns: &Arc<RwLock<HashSet<String>>>,
        broadcast_tx: &broadcast::Sender<ReceivedMessage>,
        control_rx: &mut mpsc::Receiver<SubscriberCommand>,
    ) -> SubscriberResult<bool> {
        let client = Client::open(config.redis_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;

        {
            let existing = patterns.read().await;
            for pattern in existing.iter() {
                pubsub.psubscribe(pattern).await?;
            }
        }

        tracing::info!("Subscriber connected to Redis");

        let mut stream = pubsub.on_message();

        loop {
            tokio::select! {
                msg = stream.next() => {
                    let Some(msg) = msg else {
                        tracing::warn!("Pub/Sub stream ended");
                        return Ok(false);
                    };

                    let channel_name = msg.get_channel_name().to_string();
                    let payload: String = msg.get_payload().unwrap_or_default();
                    let received = ReceivedMessage::from_redis(&channel_name, payload);

                    // No receivers is not an error
                    let _ = broadcast_tx.send(received);

                    tracing::trace!(channel = %channel_name, "Received Pub/Sub message");
                }

                cmd = control_rx.recv() => {
                    match cmd {
                        Some(SubscriberCommand::PSubscribe(new_patterns)) => {
                            drop(stream);
                            for pattern in new_patterns {
                                if let Err(e) = pubsub.psubscribe(&pattern).await {
                                    tracing::error!(
                                        pattern = %pattern,
                                        error = %e,
                                        "Failed to subscribe"
                                    );
                                } else {
                                    tracing::debug!(pattern = %pattern, "Subscribed");
                                    patterns.write().await.insert(pattern);
                                }
                            }
                            stream = pubsub.on_message();
                        }
                        Some(SubscriberCommand::Shutdown) | None => {
                            return Ok(true);
                        }
                    }
                }
            }
        }
    }

    async fn send(&self, command: SubscriberCommand) -> SubscriberResult<()> {
        self.control_tx
            .send(command)
            .await
            .map_err(|_| SubscriberError::ChannelClosed)
    }

    /// Subscribe to glob patterns such as `user:*`
    pub async fn psubscribe(&self, patterns: &[&str]) -> SubscriberResult<()> {
        let patterns = patterns.iter().map(|p| (*p).to_string()).collect();
        self.send(SubscriberCommand::PSubscribe(patterns)).await
    }

    /// Get a receiver for broadcast messages
    #[must_use]
    pub fn receiver(&self) -> broadcast::Receiver<ReceivedMessage> {
        self.broadcast_tx.subscribe()
    }

    /// Shutdown the subscriber
    pub async fn shutdown(&self) -> SubscriberResult<()> {
        self.send(SubscriberCommand::Shutdown).await
    }
}

/// Builder for subscriber
pub struct SubscriberBuilder {
    config: SubscriberConfig,
    initial_patterns: Vec<String>,
}

impl SubscriberBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SubscriberConfig::default(),
            initial_patterns: Vec::new(),
        }
    }

    /// Set Redis URL
    #[must_use]
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.config.redis_url = url.into();
        self
    }

    /// Set broadcast buffer size
    #[must_use]
    pub fn broadcast_buffer(mut self, size: usize) -> Self {
        self.config.broadcast_buffer = size;
        self
    }

    /// Set reconnection delay
    #[must_use]
    pub fn reconnect_delay_ms(mut self, delay: u64) -> Self {
        self.config.reconnect_delay_ms = delay;
        self
    }

    /// Add initial pattern subscription
    #[must_use]
    pub fn psubscribe(mut self, pattern: impl Into<String>) -> Self {
        self.initial_patterns.push(pattern.into());
        self
    }

    /// Build and start the subscriber
    pub async fn build(self) -> SubscriberResult<Subscriber> {
        let subscriber = Subscriber::new(self.config);

        if !self.initial_patterns.is_empty() {
            let patterns: Vec<&str> = self.initial_patterns.iter().map(String::as_str).collect();
            subscriber.psubscribe(&patterns).await?;
        }

        Ok(subscriber)
    }
}

impl Default for SubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}
