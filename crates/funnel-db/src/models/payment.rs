//! Payment database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for payments table
#[derive(Debug, Clone, FromRow)]
pub struct PaymentModel {
    pub id: i64,
    pub user_id: i64,
    pub subscription_id: i64,
    pub payment_method: String,
    pub amount_cents: i64,
    pub tx_hash: Option<String>,
    pub order_id: Option<String>,
    pub receipt_path: Option<String>,
    pub status: String,
    pub verified_by: Option<i64>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Pending payment joined with user and subscription columns
#[derive(Debug, Clone, FromRow)]
pub struct PendingPaymentModel {
    #[sqlx(flatten)]
    pub payment: PaymentModel,
    pub user_name: String,
    pub user_email: Option<String>,
    pub service_type: String,
    pub duration_months: i32,
}
