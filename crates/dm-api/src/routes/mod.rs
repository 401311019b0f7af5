//! Route definitions
//!
//! All API routes mounted under /api/v1.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{health, messages};
use crate::state::AppState;

/// Create the main API router (health routes are mounted separately)
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

/// Health check routes (exported separately to bypass rate limiting)
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new().merge(message_routes())
}

/// Direct message routes
fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/messages/send", post(messages::send_message))
        .route("/messages/conversations", get(messages::list_conversations))
        .route(
            "/messages/conversations/:conversation_id",
            get(messages::get_conversation_messages),
        )
        .route(
            "/messages/conversations/:conversation_id/read",
            post(messages::mark_conversation_read),
        )
        .route(
            "/messages/conversation/:other_user_id",
            get(messages::get_messages_with_user),
        )
        .route("/messages/unread-count", get(messages::unread_count))
}
