//! # funnel-common
//!
//! Shared utilities: environment configuration (including the service
//! catalog and payment destinations), the application error type, and
//! tracing setup.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    AdminIds, AppConfig, BotConfig, BroadcastConfig, ConfigError, DatabaseConfig, Environment,
    PaymentsConfig, RedisConfig, SchedulerConfig, ServerConfig, ServiceCatalog, ServiceOffer,
    SessionBackend, SessionConfig, SmtpConfig,
};
pub use error::{AppError, AppResult};
pub use telemetry::{try_init_tracing_with_config, TracingConfig, TracingError};
