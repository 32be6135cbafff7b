//! User database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for users table
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub user_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub language: String,
    pub referral_code: String,
    pub referred_by: Option<i64>,
    pub telegram_username: Option<String>,
    pub privacy_allowed: bool,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

/// Aggregate row for the admin panel
#[derive(Debug, Clone, Copy, FromRow)]
pub struct UserStatsModel {
    pub total: i64,
    pub new_this_week: i64,
    pub active: i64,
}
