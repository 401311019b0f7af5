//! Typing handlers (op 20 / op 21)
//!
//! Typing state is forwarded to the recipient's local connections and
//! nothing else. No persistence, no fan-out through Redis, no debouncing.

use super::{HandlerError, HandlerResult};
use crate::connection::{Connection, ConnectionManager};
use crate::protocol::{CloseCode, GatewayMessage, TypingEventPayload, TypingPayload};
use dm_core::RealtimeEventKind;
use std::sync::Arc;

pub struct TypingHandler;

impl TypingHandler {
    /// Forward a typing transition from `connection`'s user to the recipient
    ///
    /// Dropped silently when the recipient is the sender or is not connected.
    pub fn handle(
        manager: &ConnectionManager,
        connection: &Arc<Connection>,
        kind: RealtimeEventKind,
        payload: TypingPayload,
    ) -> HandlerResult<Option<CloseCode>> {
        let from = connection.user_id();

        if payload.recipient_id == from {
            tracing::debug!(session_id = %connection.session_id(), "Typing to self ignored");
            return Ok(None);
        }

        let event = TypingEventPayload {
            from_user_id: from,
            conversation_id: payload.conversation_id,
        };
        let data = serde_json::to_value(event)
            .map_err(|e| HandlerError::Internal(e.to_string()))?;

        let sent = manager.send_to_user(
            payload.recipient_id,
            &GatewayMessage::dispatch(kind.as_str(), data),
        );

        tracing::trace!(
            from = %from,
            to = %payload.recipient_id,
            event = %kind,
            sent,
            "Typing event forwarded"
        );

        Ok(None)
    }
}
