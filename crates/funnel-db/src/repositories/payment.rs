//! PostgreSQL implementation of PaymentRepository
//!
//! Review decisions are a conditional `UPDATE ... WHERE status = 'pending'`,
//! so two admins racing on the same payment produce exactly one transition.
//! Approval also activates the subscription inside the same transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use funnel_core::{
    Approval, DomainError, Money, NewPayment, Payment, PaymentId, PaymentRepository,
    PaymentStatus, PendingPayment, RepoResult, RevenueStats, Subscription, SubscriptionId,
    SubscriptionStatus, UserId,
};

use crate::mappers::parse_column;
use crate::models::{PaymentModel, PendingPaymentModel, SubscriptionModel};

use super::error::{map_db_error, payment_not_found, subscription_not_found};
use super::subscription::SUBSCRIPTION_COLUMNS;

const PAYMENT_COLUMNS: &str = r"
    id, user_id, subscription_id, payment_method, amount_cents, tx_hash, order_id,
    receipt_path, status, verified_by, verified_at, created_at
";

/// PostgreSQL implementation of PaymentRepository
#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Move a pending payment to `status`, or explain why it could not move
async fn decide(
    conn: &mut PgConnection,
    id: PaymentId,
    status: PaymentStatus,
    admin: UserId,
    at: DateTime<Utc>,
) -> RepoResult<Payment> {
    let sql = format!(
        r"
        UPDATE payments
        SET status = $2, verified_by = $3, verified_at = $4
        WHERE id = $1 AND status = 'pending'
        RETURNING {PAYMENT_COLUMNS}
        "
    );
    let updated = sqlx::query_as::<_, PaymentModel>(&sql)
        .bind(id.into_inner())
        .bind(status.as_str())
        .bind(admin.into_inner())
        .bind(at)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_db_error)?;

    if let Some(model) = updated {
        return Payment::try_from(model);
    }

    let current = sqlx::query_scalar::<_, String>("SELECT status FROM payments WHERE id = $1")
        .bind(id.into_inner())
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_db_error)?;
    match current {
        Some(raw) => Err(DomainError::PaymentAlreadyProcessed {
            id,
            status: parse_column("status", &raw)?,
        }),
        None => Err(payment_not_found(id)),
    }
}

/// `pending -> active` for the subscription a payment paid for
async fn activate(
    conn: &mut PgConnection,
    id: SubscriptionId,
    start: DateTime<Utc>,
) -> RepoResult<Subscription> {
    let sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1 FOR UPDATE");
    let pending = sqlx::query_as::<_, SubscriptionModel>(&sql)
        .bind(id.into_inner())
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_db_error)?
        .map(Subscription::try_from)
        .transpose()?
        .ok_or_else(|| subscription_not_found(id))?;
    if pending.status != SubscriptionStatus::Pending {
        return Err(DomainError::SubscriptionNotPending(id));
    }

    let sql = format!(
        r"
        UPDATE subscriptions
        SET status = 'active', start_date = $2, expiry_date = $3
        WHERE id = $1
        RETURNING {SUBSCRIPTION_COLUMNS}
        "
    );
    let model = sqlx::query_as::<_, SubscriptionModel>(&sql)
        .bind(id.into_inner())
        .bind(start)
        .bind(pending.expiry_from(start))
        .fetch_one(&mut *conn)
        .await
        .map_err(map_db_error)?;

    Subscription::try_from(model)
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    #[instrument(skip(self))]
    async fn next_id(&self) -> RepoResult<PaymentId> {
        sqlx::query_scalar::<_, i64>("SELECT nextval(pg_get_serial_sequence('payments', 'id'))")
            .fetch_one(&self.pool)
            .await
            .map(PaymentId::new)
            .map_err(map_db_error)
    }

    #[instrument(skip(self, payment), fields(payment_id = %payment.id, user_id = %payment.user_id))]
    async fn create(&self, payment: &NewPayment) -> RepoResult<Payment> {
        let sql = format!(
            r"
            INSERT INTO payments (id, user_id, subscription_id, payment_method, amount_cents,
                                  tx_hash, order_id, receipt_path, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
            RETURNING {PAYMENT_COLUMNS}
            "
        );
        let model = sqlx::query_as::<_, PaymentModel>(&sql)
            .bind(payment.id.into_inner())
            .bind(payment.user_id.into_inner())
            .bind(payment.subscription_id.into_inner())
            .bind(payment.payment_method.as_str())
            .bind(payment.amount.cents())
            .bind(&payment.tx_hash)
            .bind(&payment.order_id)
            .bind(&payment.receipt_path)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Payment::try_from(model)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: PaymentId) -> RepoResult<Option<Payment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");
        sqlx::query_as::<_, PaymentModel>(&sql)
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .map(Payment::try_from)
            .transpose()
    }

    /// Dropping the transaction on any error rolls back the payment update
    #[instrument(skip(self))]
    async fn approve(&self, id: PaymentId, admin: UserId, at: DateTime<Utc>) -> RepoResult<Approval> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let payment = decide(&mut tx, id, PaymentStatus::Approved, admin, at).await?;
        let subscription = activate(&mut tx, payment.subscription_id, at).await?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(Approval {
            payment,
            subscription,
        })
    }

    #[instrument(skip(self))]
    async fn reject(&self, id: PaymentId, admin: UserId, at: DateTime<Utc>) -> RepoResult<Payment> {
        let mut conn = self.pool.acquire().await.map_err(map_db_error)?;
        decide(&mut conn, id, PaymentStatus::Rejected, admin, at).await
    }

    #[instrument(skip(self))]
    async fn list_pending(&self, limit: i64) -> RepoResult<Vec<PendingPayment>> {
        sqlx::query_as::<_, PendingPaymentModel>(
            r"
            SELECT p.id, p.user_id, p.subscription_id, p.payment_method, p.amount_cents,
                   p.tx_hash, p.order_id, p.receipt_path, p.status, p.verified_by,
                   p.verified_at, p.created_at,
                   u.name AS user_name, u.email AS user_email,
                   s.service_type, s.duration_months
            FROM payments p
            JOIN users u ON u.user_id = p.user_id
            JOIN subscriptions s ON s.id = p.subscription_id
            WHERE p.status = 'pending'
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?
        .into_iter()
        .map(PendingPayment::try_from)
        .collect()
    }

    #[instrument(skip(self))]
    async fn count_pending(&self) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payments WHERE status = 'pending'")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn revenue_stats(&self, since: Option<DateTime<Utc>>) -> RepoResult<RevenueStats> {
        let (total, count) = sqlx::query_as::<_, (i64, i64)>(
            r"
            SELECT COALESCE(SUM(amount_cents), 0)::BIGINT, COUNT(*)
            FROM payments
            WHERE status = 'approved' AND ($1::TIMESTAMPTZ IS NULL OR verified_at > $1)
            ",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(RevenueStats::from_total(Money::from_cents(total), count))
    }
}
