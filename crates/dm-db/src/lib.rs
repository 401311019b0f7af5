//! # dm-db
//!
//! The conversation store: PostgreSQL implementations of the repository
//! traits defined in `dm-core`, via SQLx.
//!
//! - Connection pool management and idempotent schema setup
//! - Database models with SQLx `FromRow` derives
//! - Entity <-> Model mappers
//! - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dm_db::{create_pool, ensure_schema, DatabaseConfig, PgConversationRepository};
//!
//! async fn example(config: &dm_common::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::from(&config.database)).await?;
//!     ensure_schema(&pool).await?;
//!     let conversations = PgConversationRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, ensure_schema, ping, DatabaseConfig, PgPool};
pub use repositories::{PgConversationRepository, PgMessageRepository, PgUserDirectory};
