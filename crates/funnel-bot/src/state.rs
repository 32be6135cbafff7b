//! Health endpoint state

use funnel_cache::SharedRedisPool;
use funnel_db::PgPool;

/// Handles for the readiness checks
#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    redis: Option<SharedRedisPool>,
}

impl AppState {
    pub fn new(pool: PgPool, redis: Option<SharedRedisPool>) -> Self {
        Self { pool, redis }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// `None` when sessions live in Postgres and Redis is not configured
    pub fn redis(&self) -> Option<&SharedRedisPool> {
        self.redis.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("pool", &"PgPool")
            .field("redis", &self.redis.is_some())
            .finish()
    }
}
