//! # dm-gateway
//!
//! Real-time WebSocket gateway for direct messages: delivers message and
//! read notifications to online participants and relays typing state.

pub mod broadcast;
pub mod connection;
pub mod handlers;
pub mod protocol;
pub mod server;

pub use broadcast::GatewayNotifier;
pub use server::{create_app, create_gateway_state, create_router, run, run_server, GatewayState};
