//! # funnel-cache
//!
//! Redis layer: a managed connection pool and the Redis-backed
//! conversation session store.
//!
//! ## Example
//!
//! ```ignore
//! use funnel_cache::{RedisPool, RedisPoolConfig, RedisSessionStore};
//!
//! let pool = RedisPool::new(RedisPoolConfig::from(&redis_section))?;
//! let sessions = RedisSessionStore::new(pool, config.session.max_age());
//! ```

pub mod pool;
pub mod session;

// Re-export pool types
pub use pool::{
    RedisPool, RedisPoolConfig, RedisPoolError, RedisResult, SharedRedisPool,
};

// Re-export session types
pub use session::{RedisSessionStore, SESSION_PREFIX};
