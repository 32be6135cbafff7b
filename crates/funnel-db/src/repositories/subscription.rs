//! PostgreSQL implementation of SubscriptionRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, instrument};

use funnel_core::{
    NewSubscription, RepoResult, ServiceStats, Subscription, SubscriptionId,
    SubscriptionRepository, SubscriptionWithUser, UserId,
};

use crate::models::{ServiceStatsModel, SubscriptionModel, SubscriptionWithUserModel};

use super::error::map_db_error;

pub(super) const SUBSCRIPTION_COLUMNS: &str = r"
    id, user_id, service_type, duration_months, amount_cents, payment_method, status,
    start_date, expiry_date, created_at
";

const JOINED_COLUMNS: &str = r"
    s.id, s.user_id, s.service_type, s.duration_months, s.amount_cents, s.payment_method,
    s.status, s.start_date, s.expiry_date, s.created_at,
    u.name AS user_name, u.email AS user_email, u.language AS user_language
";

/// PostgreSQL implementation of SubscriptionRepository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn joined(
        &self,
        status: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        inclusive_end: bool,
    ) -> RepoResult<Vec<SubscriptionWithUser>> {
        let upper = if inclusive_end { "<=" } else { "<" };
        let sql = format!(
            r"
            SELECT {JOINED_COLUMNS}
            FROM subscriptions s
            JOIN users u ON u.user_id = s.user_id
            WHERE s.status = $1 AND s.expiry_date > $2 AND s.expiry_date {upper} $3
            ORDER BY s.expiry_date, s.id
            "
        );
        sqlx::query_as::<_, SubscriptionWithUserModel>(&sql)
            .bind(status)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?
            .into_iter()
            .map(SubscriptionWithUser::try_from)
            .collect()
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    #[instrument(skip(self, subscription), fields(user_id = %subscription.user_id))]
    async fn create(&self, subscription: &NewSubscription) -> RepoResult<Subscription> {
        let sql = format!(
            r"
            INSERT INTO subscriptions (user_id, service_type, duration_months, amount_cents,
                                       payment_method, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING {SUBSCRIPTION_COLUMNS}
            "
        );
        let model = sqlx::query_as::<_, SubscriptionModel>(&sql)
            .bind(subscription.user_id.into_inner())
            .bind(subscription.service.as_str())
            .bind(subscription.duration.months())
            .bind(subscription.amount.cents())
            .bind(subscription.payment_method.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Subscription::try_from(model)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: SubscriptionId) -> RepoResult<Option<Subscription>> {
        let sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1");
        sqlx::query_as::<_, SubscriptionModel>(&sql)
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .map(Subscription::try_from)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn find_active(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Subscription>> {
        let sql = format!(
            r"
            SELECT {SUBSCRIPTION_COLUMNS}
            FROM subscriptions
            WHERE user_id = $1 AND status = 'active' AND expiry_date > $2
            ORDER BY expiry_date DESC, id DESC
            LIMIT 1
            "
        );
        sqlx::query_as::<_, SubscriptionModel>(&sql)
            .bind(user_id.into_inner())
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .map(Subscription::try_from)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn expire_overdue(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE subscriptions
            SET status = 'expired'
            WHERE status = 'active' AND expiry_date < $1
            ",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        let expired = result.rows_affected();
        if expired > 0 {
            info!(expired, "Expired overdue subscriptions");
        }
        Ok(expired)
    }

    #[instrument(skip(self))]
    async fn find_expiring(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> RepoResult<Vec<SubscriptionWithUser>> {
        self.joined("active", now, until, true).await
    }

    #[instrument(skip(self))]
    async fn find_recently_expired(
        &self,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> RepoResult<Vec<SubscriptionWithUser>> {
        self.joined("expired", since, now, false).await
    }

    #[instrument(skip(self))]
    async fn service_stats(&self, now: DateTime<Utc>) -> RepoResult<Vec<ServiceStats>> {
        sqlx::query_as::<_, ServiceStatsModel>(
            r"
            SELECT s.service_type,
                   COUNT(DISTINCT s.id) FILTER (WHERE s.status = 'active' AND s.expiry_date > $1)
                       AS active_subscriptions,
                   COALESCE(SUM(p.amount_cents) FILTER (WHERE p.status = 'approved'), 0)::BIGINT
                       AS revenue_cents
            FROM subscriptions s
            LEFT JOIN payments p ON p.subscription_id = s.id
            GROUP BY s.service_type
            ORDER BY s.service_type
            ",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?
        .into_iter()
        .map(ServiceStats::try_from)
        .collect()
    }
}
