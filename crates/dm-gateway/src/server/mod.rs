//! Gateway server setup
//!
//! Routes, state construction and the listener loop.

mod handler;
mod state;

pub use handler::{gateway_handler, GatewayQuery};
pub use state::GatewayState;

use crate::broadcast::{EventDispatcher, EventDispatcherConfig};
use crate::connection::ConnectionManager;
use axum::{routing::get, Router};
use dm_common::{shutdown_signal, AppConfig, AppError, JwtService};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize all dependencies and create `GatewayState`
pub async fn create_gateway_state(config: &AppConfig) -> Result<GatewayState, AppError> {
    let jwt_service = Arc::new(JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expiry,
    ));

    let connection_manager = ConnectionManager::new_shared();

    tracing::info!("Subscribing to Redis user channels...");
    let dispatcher_config = EventDispatcherConfig {
        redis_url: config.redis.url.clone(),
        ..Default::default()
    };
    let event_dispatcher = EventDispatcher::new(dispatcher_config, connection_manager.clone())
        .await
        .map_err(|e| AppError::Cache(format!("Failed to create event dispatcher: {e}")))?;
    let event_dispatcher = Arc::new(event_dispatcher);
    event_dispatcher.clone().start();

    Ok(GatewayState::new(jwt_service, connection_manager)
        .with_event_dispatcher(event_dispatcher)
        .with_heartbeat_interval_ms(config.gateway.heartbeat_interval_ms))
}

/// Serve `app` until a shutdown signal arrives
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/gateway", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .gateway
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid gateway address: {e}")))?;

    let state = create_gateway_state(&config).await?;

    let app = create_app(state.clone());
    run_server(app, addr).await?;

    if let Some(dispatcher) = state.event_dispatcher() {
        dispatcher.stop().await;
    }
    tracing::info!("Gateway stopped");

    Ok(())
}
