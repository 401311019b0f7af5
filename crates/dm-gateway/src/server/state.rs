//! Gateway state

use crate::broadcast::EventDispatcher;
use crate::connection::ConnectionManager;
use crate::protocol::HelloPayload;
use dm_common::JwtService;
use std::sync::Arc;

/// Gateway application state
///
/// Holds the shared dependencies of every connection handler.
#[derive(Clone)]
pub struct GatewayState {
    /// Verifies the handshake credential
    jwt_service: Arc<JwtService>,
    /// Presence map of live connections
    connection_manager: Arc<ConnectionManager>,
    /// Redis forwarder; absent when events only arrive in-process
    event_dispatcher: Option<Arc<EventDispatcher>>,
    /// Interval advertised in Hello
    heartbeat_interval_ms: u64,
}

impl GatewayState {
    pub fn new(jwt_service: Arc<JwtService>, connection_manager: Arc<ConnectionManager>) -> Self {
        Self {
            jwt_service,
            connection_manager,
            event_dispatcher: None,
            heartbeat_interval_ms: HelloPayload::DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_event_dispatcher(mut self, dispatcher: Arc<EventDispatcher>) -> Self {
        self.event_dispatcher = Some(dispatcher);
        self
    }

    #[must_use]
    pub fn with_heartbeat_interval_ms(mut self, interval_ms: u64) -> Self {
        self.heartbeat_interval_ms = interval_ms;
        self
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn connection_manager(&self) -> &ConnectionManager {
        &self.connection_manager
    }

    pub fn event_dispatcher(&self) -> Option<&EventDispatcher> {
        self.event_dispatcher.as_deref()
    }

    pub fn heartbeat_interval_ms(&self) -> u64 {
        self.heartbeat_interval_ms
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("connection_manager", &self.connection_manager)
            .field("event_dispatcher", &self.event_dispatcher.is_some())
            .field("heartbeat_interval_ms", &self.heartbeat_interval_ms)
            .finish()
    }
}
