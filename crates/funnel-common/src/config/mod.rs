//! Configuration structs

mod app_config;
mod catalog;

pub use app_config::{
    AdminIds, AppConfig, BotConfig, BroadcastConfig, ConfigError, DatabaseConfig, Environment,
    PaymentsConfig, RedisConfig, SchedulerConfig, ServerConfig, SessionBackend, SessionConfig,
    SmtpConfig,
};
pub use catalog::{ServiceCatalog, ServiceOffer};
