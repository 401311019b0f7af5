//! Op code handlers
//!
//! Handles incoming client frames based on their operation code.

mod error;
mod heartbeat;
mod typing;

pub use error::{HandlerError, HandlerResult};
pub use heartbeat::HeartbeatHandler;
pub use typing::TypingHandler;

use crate::connection::{Connection, ConnectionManager};
use crate::protocol::{CloseCode, GatewayMessage, OpCode};
use dm_core::RealtimeEventKind;
use std::sync::Arc;

/// Dispatch incoming client frames to the matching handler
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Handle an incoming client frame
    ///
    /// `Ok(Some(code))` asks the caller to close the connection with `code`.
    pub fn dispatch(
        manager: &ConnectionManager,
        connection: &Arc<Connection>,
        message: GatewayMessage,
    ) -> HandlerResult<Option<CloseCode>> {
        if !message.is_valid_client_message() {
            tracing::warn!(
                session_id = %connection.session_id(),
                op = %message.op,
                "Received server-only op code from client"
            );
            return Ok(Some(CloseCode::UnknownOpcode));
        }

        match message.op {
            OpCode::Heartbeat => {
                let seq = message.as_heartbeat_seq().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid Heartbeat payload".to_string())
                })?;

                HeartbeatHandler::handle(connection, seq)
            }
            OpCode::StartTyping | OpCode::StopTyping => {
                let payload = message.as_typing().ok_or_else(|| {
                    HandlerError::InvalidPayload("Invalid typing payload".to_string())
                })?;
                let kind = if message.op == OpCode::StartTyping {
                    RealtimeEventKind::Typing
                } else {
                    RealtimeEventKind::StoppedTyping
                };

                TypingHandler::handle(manager, connection, kind, payload)
            }
            // Server ops are rejected above
            _ => {
                tracing::error!(op = %message.op, "Unhandled client op code");
                Ok(Some(CloseCode::UnknownOpcode))
            }
        }
    }
}
