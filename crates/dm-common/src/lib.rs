//! # dm-common
//!
//! Shared utilities including configuration, error handling, credential
//! verification, telemetry and shutdown handling.

pub mod auth;
pub mod config;
pub mod error;
pub mod shutdown;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{Claims, JwtService, TokenType};
pub use config::{
    AppConfig, AppSettings, ConfigError, CorsConfig, DatabaseConfig, Environment, GatewayConfig,
    JwtConfig, RateLimitConfig, RedisConfig, ServerConfig, SnowflakeConfig,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use shutdown::shutdown_signal;
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError};
