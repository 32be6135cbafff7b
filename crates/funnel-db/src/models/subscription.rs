//! Subscription database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for subscriptions table
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionModel {
    pub id: i64,
    pub user_id: i64,
    pub service_type: String,
    pub duration_months: i32,
    pub amount_cents: i64,
    pub payment_method: String,
    pub status: String,
    pub start_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Subscription joined with its owner's contact columns
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionWithUserModel {
    #[sqlx(flatten)]
    pub subscription: SubscriptionModel,
    pub user_name: String,
    pub user_email: Option<String>,
    pub user_language: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ServiceStatsModel {
    pub service_type: String,
    pub active_subscriptions: i64,
    pub revenue_cents: i64,
}
