//! # funnel-bot
//!
//! Runtime wiring: Postgres and Redis pools, the Telegram transport, the
//! conversation engine, the job scheduler and the health endpoints.

pub mod health;
pub mod scheduler;
pub mod server;
pub mod state;
pub mod telegram;

pub use server::run;
pub use state::AppState;
