//! # funnel-db
//!
//! Database layer implementing the `funnel-core` store traits with
//! PostgreSQL via SQLx.
//!
//! - Connection pool management and schema bootstrap
//! - Row models with SQLx `FromRow` derives
//! - Row -> entity mappers
//! - Repository and session-store implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use funnel_db::{create_pool, run_migrations, PgUserRepository};
//!
//! async fn example(config: &funnel_common::DatabaseConfig) -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(config).await?;
//!     run_migrations(&pool).await?;
//!     let users = PgUserRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, ping, run_migrations, PgPool, PoolTimeouts};
pub use repositories::{
    PgPaymentRepository, PgReferralRepository, PgSessionStore, PgSubscriptionRepository,
    PgUserRepository,
};
