//! Individual WebSocket connection

use crate::protocol::{GatewayMessage, OpCode};
use dm_core::Snowflake;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// A single authenticated WebSocket connection
///
/// The credential is verified before the upgrade, so the user id is known
/// for the whole life of the connection.
pub struct Connection {
    /// Unique session ID
    session_id: String,

    user_id: Snowflake,

    /// Bounded queue drained by the socket writer task
    sender: mpsc::Sender<GatewayMessage>,

    /// Last dispatch sequence number handed out
    sequence: AtomicU64,

    last_heartbeat: RwLock<Instant>,

    created_at: Instant,
}

impl Connection {
    pub fn new(
        session_id: String,
        user_id: Snowflake,
        sender: mpsc::Sender<GatewayMessage>,
    ) -> Arc<Self> {
        Arc::new(Self {
            session_id,
            user_id,
            sender,
            sequence: AtomicU64::new(0),
            last_heartbeat: RwLock::new(Instant::now()),
            created_at: Instant::now(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn user_id(&self) -> Snowflake {
        self.user_id
    }

    /// Get the next sequence number
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Record a heartbeat received
    pub fn record_heartbeat(&self) {
        *self.last_heartbeat.write() = Instant::now();
    }

    pub fn time_since_heartbeat(&self) -> Duration {
        self.last_heartbeat.read().elapsed()
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Queue a frame without waiting
    ///
    /// Dispatch frames are stamped with this connection's next sequence
    /// number. A full or closed queue rejects the frame.
    pub fn try_send(
        &self,
        mut message: GatewayMessage,
    ) -> Result<(), TrySendError<GatewayMessage>> {
        if message.op == OpCode::Dispatch {
            message.s = Some(self.next_sequence());
        }
        self.sender.try_send(message)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .field("created_at", &self.created_at)
            .finish()
    }
}
