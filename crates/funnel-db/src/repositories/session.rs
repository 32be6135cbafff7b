//! PostgreSQL implementation of SessionStore

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::instrument;

use funnel_core::{RepoResult, SessionRecord, SessionStore, UserId};

use crate::models::SessionModel;

use super::error::map_db_error;

/// Sessions in the `user_sessions` table, one row per user
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    #[instrument(skip(self))]
    async fn get(&self, user_id: UserId) -> RepoResult<Option<SessionRecord>> {
        let model = sqlx::query_as::<_, SessionModel>(
            "SELECT user_id, step, payload, updated_at FROM user_sessions WHERE user_id = $1",
        )
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(model.map(SessionRecord::from))
    }

    #[instrument(skip(self, payload))]
    async fn put(&self, user_id: UserId, step: &str, payload: &serde_json::Value) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO user_sessions (user_id, step, payload, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET step = EXCLUDED.step,
                          payload = EXCLUDED.payload,
                          updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(user_id.into_inner())
        .bind(step)
        .bind(Json(payload))
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self, user_id: UserId) -> RepoResult<()> {
        sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(user_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn purge_stale(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE updated_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
