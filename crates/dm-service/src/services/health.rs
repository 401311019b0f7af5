//! Readiness probes for the backing stores

use async_trait::async_trait;
use dm_cache::SharedRedisPool;
use dm_db::PgPool;

/// A dependency that must answer before the process reports ready
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Name shown in the readiness report
    fn name(&self) -> &'static str;

    async fn is_ready(&self) -> bool;
}

/// Round-trips a query through the PostgreSQL pool
pub struct PgReadinessProbe {
    pool: PgPool,
}

impl PgReadinessProbe {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadinessProbe for PgReadinessProbe {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn is_ready(&self) -> bool {
        dm_db::ping(&self.pool).await.is_ok()
    }
}

/// Sends PING over the Redis pool
pub struct RedisReadinessProbe {
    pool: SharedRedisPool,
}

impl RedisReadinessProbe {
    pub fn new(pool: SharedRedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadinessProbe for RedisReadinessProbe {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn is_ready(&self) -> bool {
        self.pool.health_check().await.is_ok()
    }
}
