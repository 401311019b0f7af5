//! In-process notifier
//!
//! Lets a messaging service that shares a process with the gateway push
//! events straight to local connections, bypassing Redis.

use crate::broadcast::dispatcher::forward_event;
use crate::connection::ConnectionManager;
use async_trait::async_trait;
use dm_cache::PubSubEvent;
use dm_core::Snowflake;
use dm_service::{Notifier, NotifyError};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct GatewayNotifier {
    connection_manager: Arc<ConnectionManager>,
}

impl GatewayNotifier {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }
}

#[async_trait]
impl Notifier for GatewayNotifier {
    async fn notify(&self, user_id: Snowflake, event: &PubSubEvent) -> Result<(), NotifyError> {
        // An offline user is not an error; the store is the record.
        forward_event(&self.connection_manager, user_id, event);
        Ok(())
    }
}
