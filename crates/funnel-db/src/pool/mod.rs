//! Database connection pool management

mod postgres;

pub use postgres::{create_pool, create_pool_with, ping, run_migrations, PoolTimeouts};

// Re-export PgPool for convenience
pub use sqlx::postgres::PgPool;
