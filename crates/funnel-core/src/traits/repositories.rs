//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. Every write is a single-row statement except
//! `PaymentRepository::approve`, which updates the payment and its
//! subscription in one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    Approval, NewPayment, NewSubscription, NewUser, Payment, PendingPayment, ReferralSummary,
    RevenueStats, ServiceStats, Subscription, SubscriptionWithUser, User, UserField, UserStats,
};
use crate::error::DomainError;
use crate::value_objects::{PaymentId, SubscriptionId, UserId};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by chat identity
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>>;

    /// Find user by (lowercased) email
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    /// Find user by referral code
    async fn find_by_referral_code(&self, code: &str) -> RepoResult<Option<User>>;

    /// Insert a user. Fails with `EmailAlreadyExists`, `ReferralCodeTaken` or
    /// `UserAlreadyExists` on the matching unique violation.
    async fn create(&self, user: &NewUser) -> RepoResult<User>;

    /// Update one profile column
    async fn update_field(&self, id: UserId, field: &UserField) -> RepoResult<()>;

    /// Users newest first; `active_only` filters on the active flag
    async fn list(&self, active_only: bool, limit: Option<i64>) -> RepoResult<Vec<User>>;

    /// Totals for the admin panel, with "new" meaning joined after `since`
    async fn stats(&self, since: DateTime<Utc>) -> RepoResult<UserStats>;
}

// ============================================================================
// Subscription Repository
// ============================================================================

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a `pending` subscription
    async fn create(&self, subscription: &NewSubscription) -> RepoResult<Subscription>;

    async fn find_by_id(&self, id: SubscriptionId) -> RepoResult<Option<Subscription>>;

    /// The active subscription with expiry after `now`, latest expiry first
    async fn find_active(&self, user_id: UserId, now: DateTime<Utc>)
        -> RepoResult<Option<Subscription>>;

    /// Bulk `active -> expired` for every expiry before `now`
    async fn expire_overdue(&self, now: DateTime<Utc>) -> RepoResult<u64>;

    /// Active subscriptions expiring in `(now, until]`
    async fn find_expiring(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> RepoResult<Vec<SubscriptionWithUser>>;

    /// Expired subscriptions whose expiry falls in `(since, now)`
    async fn find_recently_expired(
        &self,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> RepoResult<Vec<SubscriptionWithUser>>;

    /// Active subscription count and approved revenue per service
    async fn service_stats(&self, now: DateTime<Utc>) -> RepoResult<Vec<ServiceStats>>;
}

// ============================================================================
// Payment Repository
// ============================================================================

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Reserve an id for a payment about to be inserted. An id that is
    /// never used leaves a gap and nothing else.
    async fn next_id(&self) -> RepoResult<PaymentId>;

    /// Insert a `pending` payment under its reserved id, receipt included
    async fn create(&self, payment: &NewPayment) -> RepoResult<Payment>;

    async fn find_by_id(&self, id: PaymentId) -> RepoResult<Option<Payment>>;

    /// `pending -> approved` and the linked subscription `pending -> active`
    /// from `at`, both or neither. A payment that is no longer pending yields
    /// `PaymentAlreadyProcessed`; a subscription that is no longer pending
    /// yields `SubscriptionNotPending`. Either way nothing changes.
    async fn approve(&self, id: PaymentId, admin: UserId, at: DateTime<Utc>)
        -> RepoResult<Approval>;

    /// `pending -> rejected`, same conflict rule as `approve`
    async fn reject(&self, id: PaymentId, admin: UserId, at: DateTime<Utc>)
        -> RepoResult<Payment>;

    /// Pending payments newest first
    async fn list_pending(&self, limit: i64) -> RepoResult<Vec<PendingPayment>>;

    async fn count_pending(&self) -> RepoResult<i64>;

    /// Approved revenue, optionally only payments verified after `since`
    async fn revenue_stats(&self, since: Option<DateTime<Utc>>) -> RepoResult<RevenueStats>;
}

// ============================================================================
// Referral Repository
// ============================================================================

#[async_trait]
pub trait ReferralRepository: Send + Sync {
    /// Insert the referral edge for `referred`. Returns `false` when that user
    /// already has one.
    async fn create(&self, referrer: UserId, referred: UserId) -> RepoResult<bool>;

    /// Referrals made by `user_id` with status `completed`
    async fn count_completed(&self, user_id: UserId) -> RepoResult<i64>;

    /// Referrals made by `user_id`, newest first
    async fn list_for_referrer(&self, user_id: UserId, limit: i64)
        -> RepoResult<Vec<ReferralSummary>>;

    async fn count_for_referrer(&self, user_id: UserId) -> RepoResult<i64>;
}
