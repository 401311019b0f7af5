//! Connection manager
//!
//! The gateway's presence map: every live connection by session id, plus a
//! `user -> sessions` index used to fan events out to all of a user's devices.

use super::Connection;
use crate::protocol::GatewayMessage;
use dm_core::Snowflake;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Manages all active WebSocket connections
pub struct ConnectionManager {
    /// Active connections by session ID
    connections: DashMap<String, Arc<Connection>>,

    /// User ID to session IDs mapping
    user_connections: DashMap<Snowflake, HashSet<String>>,
}

impl ConnectionManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            user_connections: DashMap::new(),
        }
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register an authenticated connection and enroll it in the user's group
    pub fn add_connection(
        &self,
        session_id: String,
        user_id: Snowflake,
        sender: mpsc::Sender<GatewayMessage>,
    ) -> Arc<Connection> {
        let connection = Connection::new(session_id.clone(), user_id, sender);
        self.connections
            .insert(session_id.clone(), connection.clone());
        self.user_connections
            .entry(user_id)
            .or_default()
            .insert(session_id.clone());

        tracing::debug!(session_id = %session_id, user_id = %user_id, "Connection added");

        connection
    }

    /// Remove a connection
    ///
    /// Uses `alter` then `retain` so a concurrent add for the same user is
    /// never lost between the removal and the empty-entry cleanup.
    pub fn remove_connection(&self, session_id: &str) {
        if let Some((_, connection)) = self.connections.remove(session_id) {
            let user_id = connection.user_id();

            self.user_connections.alter(&user_id, |_, mut sessions| {
                sessions.remove(session_id);
                sessions
            });
            self.user_connections
                .retain(|_, sessions| !sessions.is_empty());

            tracing::debug!(session_id = %session_id, user_id = %user_id, "Connection removed");
        }
    }

    /// Get all connections for a user
    pub fn get_user_connections(&self, user_id: Snowflake) -> Vec<Arc<Connection>> {
        self.user_connections
            .get(&user_id)
            .map(|sessions| {
                sessions
                    .iter()
                    .filter_map(|sid| self.connections.get(sid).map(|c| c.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the user has at least one live connection on this process
    pub fn is_online(&self, user_id: Snowflake) -> bool {
        self.user_connections.contains_key(&user_id)
    }

    /// Send a frame to all connections of a user
    ///
    /// Never waits on a slow socket: a full or closed queue drops the frame
    /// for that connection only. Returns how many connections accepted it.
    pub fn send_to_user(&self, user_id: Snowflake, message: &GatewayMessage) -> usize {
        let mut sent = 0;

        for conn in self.get_user_connections(user_id) {
            match conn.try_send(message.clone()) {
                Ok(()) => sent += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        session_id = %conn.session_id(),
                        user_id = %user_id,
                        "Outbound queue full, event dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(
                        session_id = %conn.session_id(),
                        "Outbound queue closed, event dropped"
                    );
                }
            }
        }

        tracing::trace!(user_id = %user_id, sent = sent, "Message sent to user connections");

        sent
    }

    /// Get the total number of active connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the number of unique connected users
    pub fn user_count(&self) -> usize {
        self.user_connections.len()
    }

    pub fn has_session(&self, session_id: &str) -> bool {
        self.connections.contains_key(session_id)
    }

}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .field("users", &self.user_connections.len())
            .finish()
    }
}
