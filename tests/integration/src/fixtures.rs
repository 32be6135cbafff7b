//! Test fixtures and data generators

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use funnel_common::AppConfig;
use funnel_core::{
    Money, NewUser, PaymentMethod, PlanDuration, ServiceKey, Subscription, SubscriptionId,
    SubscriptionStatus, UserId,
};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// The only admin in [`test_config`]
pub const ADMIN: UserId = UserId::new(900);
/// Second admin, for notification fan-out
pub const SECOND_ADMIN: UserId = UserId::new(901);

/// Scratch directory for receipt files
pub fn receipts_dir() -> PathBuf {
    std::env::temp_dir().join(format!(
        "funnel-receipts-{}-{}",
        std::process::id(),
        unique_suffix()
    ))
}

/// Configuration with Postgres sessions (no Redis), two admins and a
/// private receipts directory. `overrides` replace or add variables.
pub fn test_config(overrides: &[(&str, &str)]) -> AppConfig {
    let receipts = receipts_dir();
    let mut vars: HashMap<String, String> = [
        ("DATABASE_URL", "postgres://localhost/funnel_test"),
        ("BOT_TOKEN", "test-token"),
        ("BOT_USERNAME", "FunnelTestBot"),
        ("SUPPORT_USERNAME", "funnel_support"),
        ("SESSION_BACKEND", "postgres"),
        ("ADMIN_IDS", "900,901"),
        ("CBE_ACCOUNT", "1000123456789"),
        ("TELEBIRR_PHONE", "0911000000"),
        ("BINANCE_PAY_ID", "123456789"),
        ("BINANCE_WALLET_ADDRESS", "TXYZwallet"),
        ("BROADCAST_CONCURRENCY", "4"),
        ("BROADCAST_PROGRESS_EVERY", "2"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    vars.insert("RECEIPTS_DIR".to_string(), receipts.display().to_string());
    for (key, value) in overrides {
        vars.insert((*key).to_string(), (*value).to_string());
    }

    AppConfig::from_lookup(|key| vars.get(key).cloned()).expect("test config is valid")
}

/// A complete registration as the wizard would produce it
pub fn new_user(id: i64, name: &str, email: Option<&str>) -> NewUser {
    NewUser {
        id: UserId::new(id),
        name: name.to_string(),
        email: email.map(str::to_string),
        phone: Some("0912345678".to_string()),
        country: Some("Ethiopia".to_string()),
        language: funnel_core::Language::En,
        referral_code: format!("CODE{id:04}"),
        referred_by: None,
        telegram_username: None,
        privacy_allowed: true,
    }
}

/// Active subscription ending at `expiry`
pub fn active_subscription(
    user: UserId,
    service: ServiceKey,
    expiry: DateTime<Utc>,
) -> Subscription {
    Subscription {
        id: SubscriptionId::new(0),
        user_id: user,
        service,
        duration: PlanDuration::OneMonth,
        amount: Money::from_dollars(10),
        payment_method: PaymentMethod::Cbe,
        status: SubscriptionStatus::Active,
        start_date: Some(expiry - PlanDuration::OneMonth.period()),
        expiry_date: Some(expiry),
        created_at: expiry - PlanDuration::OneMonth.period() - Duration::hours(1),
    }
}

/// Expired subscription whose expiry was `ago` in the past
pub fn expired_subscription(user: UserId, service: ServiceKey, ago: Duration) -> Subscription {
    Subscription {
        status: SubscriptionStatus::Expired,
        ..active_subscription(user, service, Utc::now() - ago)
    }
}
