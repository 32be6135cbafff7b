//! Bot entry point
//!
//! Run with:
//! ```bash
//! cargo run -p funnel-bot
//! ```
//!
//! Configuration is loaded from environment variables (and `.env` if present).

use funnel_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Configuration first: it decides the log format
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(&TracingConfig::for_environment(config.environment)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "Bot failed");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        env = ?config.environment,
        bot = %config.bot.username,
        session_backend = ?config.session.backend,
        admins = config.admins.iter().count(),
        "Starting funnel bot..."
    );

    funnel_bot::run(config).await?;

    Ok(())
}
