//! Redis connection pool using deadpool-redis.
//!
//! Only the handful of commands the session store needs are exposed:
//! JSON values written with an expiry, read back, removed, and keys
//! enumerated by pattern for the stale-session sweep.

use deadpool_redis::{Config, Connection, Pool, Runtime};
use funnel_common::RedisConfig;
use funnel_core::DomainError;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Pool settings, normally taken from the `redis` config section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisPoolConfig {
    pub url: String,
    pub max_connections: usize,
}

impl RedisPoolConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 8,
        }
    }

    #[must_use]
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max.max(1);
        self
    }
}

impl From<&RedisConfig> for RedisPoolConfig {
    fn from(config: &RedisConfig) -> Self {
        Self::new(config.url.clone()).max_connections(config.max_connections as usize)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RedisPoolError {
    #[error("invalid redis pool settings: {0}")]
    Setup(String),

    #[error("no redis connection available: {0}")]
    Checkout(#[from] deadpool_redis::PoolError),

    #[error("redis command failed: {0}")]
    Command(#[from] redis::RedisError),

    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<RedisPoolError> for DomainError {
    fn from(err: RedisPoolError) -> Self {
        DomainError::CacheError(err.to_string())
    }
}

pub type RedisResult<T> = Result<T, RedisPoolError>;

/// Host part of a connection URL, without credentials
fn redacted(url: &str) -> &str {
    url.rsplit_once('@').map_or(url, |(_, host)| host)
}

/// Managed Redis connection pool
#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("RedisPool")
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}

impl RedisPool {
    /// Build the pool. No connection is opened until the first command.
    pub fn new(config: RedisPoolConfig) -> RedisResult<Self> {
        let pool = Config::from_url(&config.url)
            .builder()
            .map_err(|e| RedisPoolError::Setup(e.to_string()))?
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| RedisPoolError::Setup(e.to_string()))?;

        info!(
            host = %redacted(&config.url),
            max_connections = config.max_connections,
            "Redis pool created"
        );
        Ok(Self { pool })
    }

    /// Build a pool and wrap it for sharing between the session store and
    /// the readiness check
    pub fn shared(config: RedisPoolConfig) -> RedisResult<SharedRedisPool> {
        Self::new(config).map(Arc::new)
    }

    async fn conn(&self) -> RedisResult<Connection> {
        Ok(self.pool.get().await?)
    }

    /// Round trip used by the readiness check
    pub async fn ping(&self) -> RedisResult<()> {
        let mut conn = self.conn().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    /// `SET key json EX ttl`
    pub async fn put_json<V: Serialize>(&self, key: &str, value: &V, ttl_seconds: u64) -> RedisResult<()> {
        let json = serde_json::to_string(value)?;
        let mut conn = self.conn().await?;
        conn.set_ex::<_, _, ()>(key, json, ttl_seconds).await?;
        Ok(())
    }

    pub async fn get_json<V: DeserializeOwned>(&self, key: &str) -> RedisResult<Option<V>> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(key).await?;
        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(RedisPoolError::from)
    }

    /// `true` when the key existed
    pub async fn remove(&self, key: &str) -> RedisResult<bool> {
        let mut conn = self.conn().await?;
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    /// Every key matching `pattern`, walked with `SCAN` in batches of `batch`
    pub async fn keys_matching(&self, pattern: &str, batch: usize) -> RedisResult<Vec<String>> {
        let mut conn = self.conn().await?;
        let mut keys = Vec::new();
        let mut cursor = 0_u64;

        loop {
            let (next, page): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(batch)
                .query_async(&mut conn)
                .await?;
            keys.extend(page);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!(pattern, found = keys.len(), "Scanned keys");
        Ok(keys)
    }
}

pub type SharedRedisPool = Arc<RedisPool>;
