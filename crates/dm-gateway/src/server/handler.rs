//! WebSocket handler
//!
//! Authenticates the handshake, then runs one connection: a reader, a
//! writer and a heartbeat watchdog until any of them ends.

use crate::connection::Connection;
use crate::handlers::MessageDispatcher;
use crate::protocol::{
    CloseCode, GatewayMessage, HelloPayload, OpCode, ReadyPayload, READY_EVENT,
};
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use dm_common::{AppError, ErrorResponse};
use dm_core::Snowflake;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::interval;

/// Channel buffer size for outgoing messages
const MESSAGE_BUFFER_SIZE: usize = 100;

/// How long the writer gets to flush the close frame
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Handshake query parameters
#[derive(Debug, Default, Deserialize)]
pub struct GatewayQuery {
    pub token: Option<String>,
}

/// WebSocket gateway handler
///
/// The credential is checked before the upgrade; a rejected handshake gets
/// a plain HTTP 401 and no socket.
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    Query(query): Query<GatewayQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let user_id = match authenticate(&state, query.token.as_deref(), &headers) {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::debug!(error = %e, "Gateway handshake rejected");
            return reject(&e);
        }
    };

    ws.on_upgrade(move |socket| handle_socket(state, socket, user_id))
        .into_response()
}

/// Resolve the handshake credential from `?token=` or the Authorization header
fn authenticate(
    state: &GatewayState,
    query_token: Option<&str>,
    headers: &HeaderMap,
) -> Result<Snowflake, AppError> {
    let credential = query_token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()))
        .ok_or(AppError::MissingAuth)?;

    state.jwt_service().authenticate(credential)
}

fn reject(err: &AppError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::UNAUTHORIZED);
    let body = serde_json::json!({ "error": ErrorResponse::from(err) });
    (status, Json(body)).into_response()
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket, user_id: Snowflake) {
    let session_id = uuid::Uuid::new_v4().simple().to_string();
    let heartbeat_interval_ms = state.heartbeat_interval_ms();

    let (tx, rx) = mpsc::channel::<GatewayMessage>(MESSAGE_BUFFER_SIZE);
    let connection = state
        .connection_manager()
        .add_connection(session_id.clone(), user_id, tx);

    tracing::info!(
        session_id = %session_id,
        user_id = %user_id,
        "WebSocket connection established"
    );

    let (mut ws_sink, ws_stream) = socket.split();

    // Hello goes out before the writer starts so it is always the first frame
    let hello = GatewayMessage::hello(HelloPayload::with_interval(heartbeat_interval_ms));
    let sent = match hello.to_json() {
        Ok(json) => ws_sink.send(Message::Text(json)).await.is_ok(),
        Err(_) => false,
    };
    if !sent {
        tracing::warn!(session_id = %session_id, "Failed to send Hello message");
        state.connection_manager().remove_connection(&session_id);
        return;
    }

    let ready = ReadyPayload {
        user_id,
        session_id: session_id.clone(),
    };
    match serde_json::to_value(ready) {
        Ok(data) => {
            if connection
                .try_send(GatewayMessage::dispatch(READY_EVENT, data))
                .is_err()
            {
                tracing::warn!(session_id = %session_id, "Failed to queue Ready");
            }
        }
        Err(e) => tracing::error!(error = %e, "Failed to encode Ready"),
    }

    let (close_tx, close_rx) = oneshot::channel::<CloseCode>();

    let mut send_task = tokio::spawn(write_loop(ws_sink, rx, close_rx, session_id.clone()));
    let mut recv_task = tokio::spawn(read_loop(state.clone(), connection.clone(), ws_stream));
    let mut heartbeat_task =
        tokio::spawn(watch_heartbeat(connection.clone(), heartbeat_interval_ms));

    let mut writer_done = false;
    let close_code = tokio::select! {
        result = &mut recv_task => result.ok().flatten(),
        result = &mut heartbeat_task => result.ok(),
        _ = &mut send_task => {
            writer_done = true;
            None
        }
    };

    recv_task.abort();
    heartbeat_task.abort();

    if let Some(code) = close_code {
        tracing::debug!(session_id = %session_id, close_code = %code, "Closing connection");
        let _ = close_tx.send(code);
    } else {
        drop(close_tx);
    }

    if !writer_done && tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, &mut send_task).await.is_err() {
        send_task.abort();
    }

    cleanup_connection(&state, &session_id);
}

/// Read client frames until the socket ends or a frame demands a close
async fn read_loop(
    state: GatewayState,
    connection: Arc<Connection>,
    mut ws_stream: SplitStream<WebSocket>,
) -> Option<CloseCode> {
    let session_id = connection.session_id().to_string();

    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Err(close_code) = handle_text_message(&state, &connection, &text) {
                    return Some(close_code);
                }
            }
            Ok(Message::Binary(_)) => {
                tracing::debug!(session_id = %session_id, "Binary messages not supported");
                return Some(CloseCode::DecodeError);
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // Pong is handled automatically by axum
                tracing::trace!(session_id = %session_id, "Ping/Pong received");
            }
            Ok(Message::Close(_)) => {
                tracing::info!(session_id = %session_id, "Client closed connection");
                return None;
            }
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "WebSocket error");
                return None;
            }
        }
    }
    None
}

/// Drain the outbound queue into the socket
///
/// A close code arriving on `close_rx` is sent as the final frame. A dropped
/// `close_rx` sender ends the loop with a plain close.
async fn write_loop(
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<GatewayMessage>,
    mut close_rx: oneshot::Receiver<CloseCode>,
    session_id: String,
) {
    loop {
        tokio::select! {
            biased;

            code = &mut close_rx => {
                let frame = code.ok().map(|code| CloseFrame {
                    code: code.as_u16(),
                    reason: code.description().into(),
                });
                let _ = ws_sink.send(Message::Close(frame)).await;
                break;
            }
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                match msg.to_json() {
                    Ok(json) => {
                        if ws_sink.send(Message::Text(json)).await.is_err() {
                            tracing::warn!(
                                session_id = %session_id,
                                "Failed to send message to WebSocket"
                            );
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            session_id = %session_id,
                            error = %e,
                            "Failed to encode frame"
                        );
                    }
                }
            }
        }
    }

    let _ = ws_sink.close().await;
}

/// Resolve with `SessionTimeout` once no heartbeat arrived within twice the interval
async fn watch_heartbeat(connection: Arc<Connection>, heartbeat_interval_ms: u64) -> CloseCode {
    let timeout = Duration::from_millis(heartbeat_interval_ms.saturating_mul(2));
    let mut check_interval = interval(Duration::from_millis((heartbeat_interval_ms / 2).max(10)));

    loop {
        check_interval.tick().await;

        let time_since = connection.time_since_heartbeat();
        if time_since > timeout {
            tracing::warn!(
                session_id = %connection.session_id(),
                time_since_ms = time_since.as_millis(),
                "Connection timed out (no heartbeat)"
            );
            return CloseCode::SessionTimeout;
        }
    }
}

/// Handle a text frame from the client
fn handle_text_message(
    state: &GatewayState,
    connection: &Arc<Connection>,
    text: &str,
) -> Result<(), CloseCode> {
    let message = match GatewayMessage::from_json(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(
                session_id = %connection.session_id(),
                error = %e,
                "Failed to parse message"
            );
            return Err(unparsable_close_code(text));
        }
    };

    tracing::trace!(
        session_id = %connection.session_id(),
        op = %message.op,
        "Received message"
    );

    match MessageDispatcher::dispatch(state.connection_manager(), connection, message) {
        Ok(Some(close_code)) => Err(close_code),
        Ok(None) => Ok(()),
        Err(e) => {
            tracing::warn!(
                session_id = %connection.session_id(),
                error = %e,
                "Handler error"
            );
            Err(e.to_close_code().unwrap_or(CloseCode::UnknownError))
        }
    }
}

/// An envelope whose numeric `op` is not a known opcode is an opcode error,
/// anything else a decode error
fn unparsable_close_code(text: &str) -> CloseCode {
    let unknown_op = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("op").and_then(serde_json::Value::as_u64))
        .is_some_and(|op| u8::try_from(op).ok().and_then(OpCode::from_u8).is_none());

    if unknown_op {
        CloseCode::UnknownOpcode
    } else {
        CloseCode::DecodeError
    }
}

/// Clean up a connection on disconnect
fn cleanup_connection(state: &GatewayState, session_id: &str) {
    tracing::info!(session_id = %session_id, "Cleaning up connection");
    state.connection_manager().remove_connection(session_id);
}
