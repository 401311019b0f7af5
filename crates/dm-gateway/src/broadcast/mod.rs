//! Event delivery
//!
//! Moves events from the messaging service onto live WebSocket connections,
//! either through Redis Pub/Sub or directly in-process.

mod dispatcher;
mod notifier;

pub use dispatcher::{EventDispatcher, EventDispatcherConfig};
pub use notifier::GatewayNotifier;
