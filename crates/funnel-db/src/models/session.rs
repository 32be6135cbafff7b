//! Session database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for user_sessions table
#[derive(Debug, Clone, FromRow)]
pub struct SessionModel {
    pub user_id: i64,
    pub step: String,
    pub payload: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}
