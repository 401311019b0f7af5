//! # dm-api
//!
//! HTTP surface of the direct-messaging backend, built with Axum. Every
//! route under `/api/v1/messages` is an authenticated adapter over
//! `dm_service::MessagingService`.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, create_app_state, run, run_server};
pub use state::AppState;
