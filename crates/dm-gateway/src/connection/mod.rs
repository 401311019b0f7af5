//! Connection management
//!
//! Tracks live WebSocket connections and routes frames to them.

mod connection;
mod manager;

pub use connection::Connection;
pub use manager::ConnectionManager;
