//! Heartbeat handler (op 1)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::protocol::{CloseCode, GatewayMessage};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;

pub struct HeartbeatHandler;

impl HeartbeatHandler {
    /// Handle a heartbeat from the client
    ///
    /// `last_sequence` is the last dispatch sequence the client saw, if any.
    pub fn handle(
        connection: &Arc<Connection>,
        last_sequence: Option<u64>,
    ) -> HandlerResult<Option<CloseCode>> {
        connection.record_heartbeat();

        tracing::trace!(
            session_id = %connection.session_id(),
            client_seq = ?last_sequence,
            server_seq = connection.current_sequence(),
            "Heartbeat received"
        );

        match connection.try_send(GatewayMessage::heartbeat_ack()) {
            Ok(()) => Ok(None),
            Err(TrySendError::Full(_)) => Err(HandlerError::QueueFull),
            Err(TrySendError::Closed(_)) => Err(HandlerError::ConnectionClosed),
        }
    }
}
