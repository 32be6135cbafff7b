//! Application configuration structs
//!
//! Loads configuration from environment variables. The resulting value is
//! immutable and shared behind an `Arc`.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Weekday;
use funnel_core::{PaymentMethod, UserId};

use super::catalog::ServiceCatalog;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub bot: BotConfig,
    pub admins: AdminIds,
    pub catalog: ServiceCatalog,
    pub payments: PaymentsConfig,
    pub smtp: Option<SmtpConfig>,
    pub session: SessionConfig,
    pub broadcast: BroadcastConfig,
    pub scheduler: SchedulerConfig,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Health endpoint listener
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Chat bot identity and local storage
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    /// Bot username without `@`, used to build referral links
    pub username: String,
    pub support_username: String,
    pub receipts_dir: PathBuf,
}

impl BotConfig {
    #[must_use]
    pub fn support_url(&self) -> String {
        format!("https://t.me/{}", self.support_username)
    }
}

/// Read-only set of admin identities
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminIds(Vec<UserId>);

impl AdminIds {
    #[must_use]
    pub fn new(ids: impl IntoIterator<Item = UserId>) -> Self {
        let mut ids: Vec<UserId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    #[must_use]
    pub fn contains(&self, id: UserId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = UserId> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn parse(raw: &str) -> Result<Self, ConfigError> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .map(UserId::new)
                    .map_err(|_| ConfigError::InvalidValue("ADMIN_IDS".to_string(), s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }
}

/// Where users send money for each payment method
#[derive(Debug, Clone, Default)]
pub struct PaymentsConfig {
    pub binance_wallet_address: String,
    pub binance_pay_id: String,
    pub telebirr_phone: String,
    pub cbe_account: String,
    pub abyssinia_account: String,
    pub receipt_deadline_minutes: i64,
}

impl PaymentsConfig {
    /// Account, phone or wallet shown to the user for a bank-style method
    #[must_use]
    pub fn destination(&self, method: PaymentMethod) -> &str {
        match method {
            PaymentMethod::Binance => &self.binance_wallet_address,
            PaymentMethod::Cbe => &self.cbe_account,
            PaymentMethod::Telebirr => &self.telebirr_phone,
            PaymentMethod::Abyssinia => &self.abyssinia_account,
        }
    }

    #[must_use]
    pub fn receipt_deadline(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.receipt_deadline_minutes)
    }
}

/// Outbound SMTP relay
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

/// Session store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionBackend {
    #[default]
    Redis,
    Postgres,
}

impl FromStr for SessionBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub max_age_hours: i64,
}

impl SessionConfig {
    #[must_use]
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.max_age_hours)
    }
}

/// Fan-out limits for admin broadcasts
#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    pub concurrency: usize,
    pub progress_every: usize,
}

/// Job runner settings
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Offset of the business timezone from UTC; jobs are declared in local time
    pub timezone_offset_hours: i32,
}

impl SchedulerConfig {
    /// Six-field cron expression (sec min hour dom month dow) in UTC for a
    /// local wall-clock time, optionally restricted to one weekday.
    #[must_use]
    pub fn cron(&self, local_hour: u32, weekday: Option<Weekday>) -> String {
        let shifted = i64::from(local_hour) - i64::from(self.timezone_offset_hours);
        let utc_hour = shifted.rem_euclid(24);
        let day_shift = shifted.div_euclid(24);

        match weekday {
            None => format!("0 0 {utc_hour} * * *"),
            Some(day) => {
                let from_monday = i64::from(day.num_days_from_monday());
                let utc_day = (from_monday + day_shift).rem_euclid(7);
                let name = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"][utc_day as usize];
                format!("0 0 {utc_hour} * * {name}")
            }
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_receipts_dir() -> PathBuf {
    PathBuf::from("receipts")
}

fn default_receipt_deadline_minutes() -> i64 {
    60
}

fn default_smtp_port() -> u16 {
    587
}

fn default_session_max_age_hours() -> i64 {
    24
}

fn default_broadcast_concurrency() -> usize {
    4
}

fn default_progress_every() -> usize {
    10
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    ///
    /// # Errors
    /// Returns an error if required variables are missing or malformed
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&get);

        let session = SessionConfig {
            backend: match vars.get("SESSION_BACKEND") {
                Some(raw) => raw
                    .parse()
                    .map_err(|()| ConfigError::InvalidValue("SESSION_BACKEND".to_string(), raw))?,
                None => SessionBackend::default(),
            },
            max_age_hours: vars.parsed("SESSION_MAX_AGE_HOURS", default_session_max_age_hours)?,
        };

        let redis = match vars.get("REDIS_URL") {
            Some(url) => Some(RedisConfig {
                url,
                max_connections: vars
                    .parsed("REDIS_MAX_CONNECTIONS", default_redis_max_connections)?,
            }),
            None if session.backend == SessionBackend::Redis => {
                return Err(ConfigError::MissingVar("REDIS_URL"));
            }
            None => None,
        };

        let smtp = match (vars.get("SMTP_HOST"), vars.get("SMTP_FROM_EMAIL")) {
            (Some(host), Some(from_email)) => Some(SmtpConfig {
                host,
                port: vars.parsed("SMTP_PORT", default_smtp_port)?,
                username: vars.get("SMTP_USERNAME").unwrap_or_default(),
                password: vars.get("SMTP_PASSWORD").unwrap_or_default(),
                from_email,
                from_name: vars
                    .get("SMTP_FROM_NAME")
                    .unwrap_or_else(|| "Subscriptions".to_string()),
            }),
            _ => None,
        };

        let broadcast = BroadcastConfig {
            concurrency: vars.parsed("BROADCAST_CONCURRENCY", default_broadcast_concurrency)?,
            progress_every: vars.parsed("BROADCAST_PROGRESS_EVERY", default_progress_every)?,
        };
        if broadcast.concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "BROADCAST_CONCURRENCY".to_string(),
                "0".to_string(),
            ));
        }
        if broadcast.progress_every == 0 {
            return Err(ConfigError::InvalidValue(
                "BROADCAST_PROGRESS_EVERY".to_string(),
                "0".to_string(),
            ));
        }

        // A non-positive window would refuse every receipt
        let receipt_deadline_minutes: i64 =
            vars.parsed("RECEIPT_DEADLINE_MINUTES", default_receipt_deadline_minutes)?;
        if receipt_deadline_minutes <= 0 {
            return Err(ConfigError::InvalidValue(
                "RECEIPT_DEADLINE_MINUTES".to_string(),
                receipt_deadline_minutes.to_string(),
            ));
        }

        Ok(Self {
            environment: vars
                .get("APP_ENV")
                .and_then(|s| Environment::parse(&s))
                .unwrap_or_default(),
            server: ServerConfig {
                host: vars.get("SERVER_HOST").unwrap_or_else(default_host),
                port: vars.parsed("SERVER_PORT", default_port)?,
            },
            database: DatabaseConfig {
                url: vars.required("DATABASE_URL")?,
                max_connections: vars.parsed("DATABASE_MAX_CONNECTIONS", default_max_connections)?,
                min_connections: vars.parsed("DATABASE_MIN_CONNECTIONS", default_min_connections)?,
            },
            redis,
            bot: BotConfig {
                token: vars.required("BOT_TOKEN")?,
                username: vars.required("BOT_USERNAME")?.trim_start_matches('@').to_string(),
                support_username: vars
                    .get("SUPPORT_USERNAME")
                    .unwrap_or_default()
                    .trim_start_matches('@')
                    .to_string(),
                receipts_dir: vars
                    .get("RECEIPTS_DIR")
                    .map_or_else(default_receipts_dir, PathBuf::from),
            },
            admins: AdminIds::parse(&vars.get("ADMIN_IDS").unwrap_or_default())?,
            catalog: ServiceCatalog::builtin().with_overrides(&get)?,
            payments: PaymentsConfig {
                binance_wallet_address: vars.get("BINANCE_WALLET_ADDRESS").unwrap_or_default(),
                binance_pay_id: vars.get("BINANCE_PAY_ID").unwrap_or_default(),
                telebirr_phone: vars.get("TELEBIRR_PHONE").unwrap_or_default(),
                cbe_account: vars.get("CBE_ACCOUNT").unwrap_or_default(),
                abyssinia_account: vars.get("ABYSSINIA_ACCOUNT").unwrap_or_default(),
                receipt_deadline_minutes,
            },
            smtp,
            session,
            broadcast,
            scheduler: SchedulerConfig {
                enabled: vars.parsed("SCHEDULER_ENABLED", || true)?,
                timezone_offset_hours: vars.parsed("SCHEDULER_TIMEZONE_OFFSET_HOURS", || 0)?,
            },
        })
    }

    /// Check whether a chat identity is on the admin allow-list
    #[must_use]
    pub fn is_admin(&self, id: UserId) -> bool {
        self.admins.contains(id)
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-empty value of a variable
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::MissingVar(key))
    }

    fn parsed<T: FromStr>(&self, key: &str, default: impl FnOnce() -> T) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string(), raw)),
            None => Ok(default()),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
