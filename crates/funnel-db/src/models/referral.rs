//! Referral database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for referrals table
#[derive(Debug, Clone, FromRow)]
pub struct ReferralModel {
    pub id: i64,
    pub referrer_id: i64,
    pub referred_id: i64,
    pub reward_type: String,
    pub reward_amount: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReferralSummaryModel {
    #[sqlx(flatten)]
    pub referral: ReferralModel,
    pub referred_name: String,
}
