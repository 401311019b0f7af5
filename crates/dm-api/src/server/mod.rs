//! Server setup and initialization
//!
//! Provides the application builder, dependency wiring and the listener loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use dm_cache::{Publisher, RedisPool, RedisPoolConfig};
use dm_common::{shutdown_signal, AppConfig, AppError, JwtService};
use dm_core::SnowflakeGenerator;
use dm_db::{
    create_pool, ensure_schema, PgConversationRepository, PgMessageRepository, PgUserDirectory,
};
use dm_service::{PgReadinessProbe, RedisNotifier, RedisReadinessProbe, ServiceContextBuilder};
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::{apply_common_layers, apply_rate_limit};
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
///
/// Health routes sit outside the rate limiter but share every other layer.
pub fn create_app(state: AppState) -> Router {
    let config = state.config();
    let api = apply_rate_limit(create_router(), &config.rate_limit);

    apply_common_layers(
        api.merge(health_routes()),
        &config.cors,
        config.app.env.is_production(),
    )
    .with_state(state)
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    info!("Connecting to PostgreSQL...");
    let db_config = dm_db::DatabaseConfig::from(&config.database);
    let pool = create_pool(&db_config)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    ensure_schema(&pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to prepare schema: {e}")))?;
    info!("PostgreSQL connection established");

    info!("Connecting to Redis...");
    let redis_pool = RedisPool::new(RedisPoolConfig::from(&config.redis))
        .map_err(|e| AppError::Cache(e.to_string()))?;
    let shared_redis = Arc::new(redis_pool.clone());
    info!("Redis pool created");

    let jwt_service = Arc::new(JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expiry,
    ));
    let snowflake_generator = Arc::new(SnowflakeGenerator::new(config.snowflake.worker_id));

    let service_context = ServiceContextBuilder::new()
        .conversation_repo(Arc::new(PgConversationRepository::new(pool.clone())))
        .message_repo(Arc::new(PgMessageRepository::new(pool.clone())))
        .user_directory(Arc::new(PgUserDirectory::new(pool.clone())))
        .notifier(Arc::new(RedisNotifier::new(Publisher::new(redis_pool))))
        .jwt_service(jwt_service)
        .snowflake_generator(snowflake_generator)
        .readiness_probe(Arc::new(PgReadinessProbe::new(pool)))
        .readiness_probe(Arc::new(RedisReadinessProbe::new(shared_redis)))
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(service_context, config))
}

/// Serve `app` until a shutdown signal arrives
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    info!("HTTP server stopped");
    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid API address: {e}")))?;

    let state = create_app_state(config).await?;
    let app = create_app(state);

    run_server(app, addr).await
}
