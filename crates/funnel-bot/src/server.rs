//! Runtime setup
//!
//! Builds the stores, the transport and the conversation engine, then runs
//! the health server, the scheduler and the Telegram dispatcher together.

use std::net::SocketAddr;
use std::sync::Arc;

use funnel_cache::{RedisPool, RedisPoolConfig, RedisSessionStore, SharedRedisPool};
use funnel_common::{AppConfig, AppError, SessionBackend};
use funnel_core::SessionStore;
use funnel_db::{
    create_pool, run_migrations, PgPaymentRepository, PgPool, PgReferralRepository,
    PgSessionStore, PgSubscriptionRepository, PgUserRepository,
};
use funnel_service::{
    ConversationEngine, LogMailer, Mailer, ServiceContext, ServiceContextBuilder, SmtpMailer,
};
use teloxide::Bot;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::health;
use crate::scheduler;
use crate::state::AppState;
use crate::telegram::{self, TelegramTransport};

/// Connect to Postgres and apply the schema
async fn connect_database(config: &AppConfig) -> Result<PgPool, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&config.database)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    run_migrations(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");
    Ok(pool)
}

fn connect_redis(config: &AppConfig) -> Result<Option<SharedRedisPool>, AppError> {
    let Some(redis) = config.redis.as_ref() else {
        return Ok(None);
    };
    info!("Connecting to Redis...");
    let pool = RedisPool::shared(RedisPoolConfig::from(redis))
        .map_err(|e| AppError::Cache(e.to_string()))?;
    Ok(Some(pool))
}

fn session_store(
    config: &AppConfig,
    pool: &PgPool,
    redis: Option<&SharedRedisPool>,
) -> Result<Arc<dyn SessionStore>, AppError> {
    match config.session.backend {
        SessionBackend::Redis => {
            let redis = redis.ok_or_else(|| {
                AppError::Cache("the redis session backend needs REDIS_URL".to_string())
            })?;
            Ok(Arc::new(RedisSessionStore::new(
                redis.as_ref().clone(),
                config.session.max_age(),
            )))
        }
        SessionBackend::Postgres => Ok(Arc::new(PgSessionStore::new(pool.clone()))),
    }
}

fn mailer(config: &AppConfig) -> Result<Arc<dyn Mailer>, AppError> {
    match config.smtp.as_ref() {
        Some(smtp) => {
            let mailer =
                SmtpMailer::new(smtp).map_err(|e| AppError::ExternalService(e.to_string()))?;
            info!(host = %smtp.host, "SMTP mailer configured");
            Ok(Arc::new(mailer))
        }
        None => {
            warn!("SMTP not configured, emails will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Wire every dependency into a [`ServiceContext`]
pub fn create_context(
    config: Arc<AppConfig>,
    pool: &PgPool,
    redis: Option<&SharedRedisPool>,
    transport: Arc<TelegramTransport>,
) -> Result<ServiceContext, AppError> {
    let sessions = session_store(&config, pool, redis)?;
    let mailer = mailer(&config)?;

    let ctx = ServiceContextBuilder::new()
        .users(Arc::new(PgUserRepository::new(pool.clone())))
        .subscriptions(Arc::new(PgSubscriptionRepository::new(pool.clone())))
        .payments(Arc::new(PgPaymentRepository::new(pool.clone())))
        .referrals(Arc::new(PgReferralRepository::new(pool.clone())))
        .sessions(sessions)
        .transport(transport)
        .mailer(mailer)
        .config(config)
        .build()?;
    Ok(ctx)
}

/// Serve the health endpoints in the background
async fn spawn_health_server(config: &AppConfig, state: AppState) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .server
        .address()
        .parse()
        .map_err(|e| AppError::Validation(format!("invalid server address: {e}")))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::ExternalService(format!("Failed to bind to {addr}: {e}")))?;
    info!("Health endpoints listening on http://{}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health::router(state)).await {
            error!(error = %e, "Health server failed");
        }
    });
    Ok(())
}

/// Run the bot until Ctrl-C
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let config = Arc::new(config);

    let pool = connect_database(&config).await?;
    let redis = connect_redis(&config)?;

    let bot = Bot::new(config.bot.token.clone());
    let transport = Arc::new(TelegramTransport::new(bot.clone()));

    let ctx = Arc::new(create_context(
        Arc::clone(&config),
        &pool,
        redis.as_ref(),
        Arc::clone(&transport),
    )?);
    let engine = Arc::new(ConversationEngine::new(Arc::clone(&ctx)));

    spawn_health_server(&config, AppState::new(pool, redis)).await?;

    let mut jobs = if config.scheduler.enabled {
        let jobs = scheduler::start(&config.scheduler, Arc::clone(&ctx), engine.runner().clone())
            .await
            .map_err(|e| AppError::ExternalService(e.to_string()))?;
        Some(jobs)
    } else {
        info!("Scheduler disabled");
        None
    };

    telegram::dispatch(bot, engine, transport).await;

    if let Some(jobs) = jobs.as_mut() {
        if let Err(e) = jobs.shutdown().await {
            warn!(error = %e, "Scheduler shutdown failed");
        }
    }
    info!("Bot stopped");
    Ok(())
}
