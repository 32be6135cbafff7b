//! PostgreSQL implementation of ReferralRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use funnel_core::{
    ReferralRepository, ReferralSummary, RepoResult, UserId, DEFAULT_REWARD_DAYS,
};

use crate::models::ReferralSummaryModel;

use super::error::map_db_error;

/// PostgreSQL implementation of ReferralRepository
#[derive(Clone)]
pub struct PgReferralRepository {
    pool: PgPool,
}

impl PgReferralRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferralRepository for PgReferralRepository {
    #[instrument(skip(self))]
    async fn create(&self, referrer: UserId, referred: UserId) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            INSERT INTO referrals (referrer_id, referred_id, reward_type, reward_amount, status)
            VALUES ($1, $2, 'extension', $3, 'pending')
            ON CONFLICT (referred_id) DO NOTHING
            ",
        )
        .bind(referrer.into_inner())
        .bind(referred.into_inner())
        .bind(DEFAULT_REWARD_DAYS)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn count_completed(&self, user_id: UserId) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM referrals WHERE referrer_id = $1 AND status = 'completed'",
        )
        .bind(user_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn list_for_referrer(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> RepoResult<Vec<ReferralSummary>> {
        sqlx::query_as::<_, ReferralSummaryModel>(
            r"
            SELECT r.id, r.referrer_id, r.referred_id, r.reward_type, r.reward_amount,
                   r.status, r.created_at, u.name AS referred_name
            FROM referrals r
            JOIN users u ON u.user_id = r.referred_id
            WHERE r.referrer_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $2
            ",
        )
        .bind(user_id.into_inner())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?
        .into_iter()
        .map(ReferralSummary::try_from)
        .collect()
    }

    #[instrument(skip(self))]
    async fn count_for_referrer(&self, user_id: UserId) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM referrals WHERE referrer_id = $1")
            .bind(user_id.into_inner())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }
}
