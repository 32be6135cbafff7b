//! In-memory implementation of every store trait
//!
//! Mirrors the conditional updates of the Postgres repositories so the
//! single-shot approval and activation rules hold in tests as well. Single
//! operations can be made to fail once with [`MemoryStore::fail_next`].

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use funnel_core::{
    Approval, DomainError, Money, NewPayment, NewSubscription, NewUser, Payment, PaymentId,
    PaymentRepository, PaymentStatus, PendingPayment, Referral, ReferralId, ReferralRepository,
    ReferralStatus, ReferralSummary, RepoResult, RevenueStats, RewardType, ServiceStats,
    SessionRecord, SessionStore, Subscription, SubscriptionId, SubscriptionRepository,
    SubscriptionStatus, SubscriptionWithUser, User, UserField, UserId, UserRepository, UserStats,
    DEFAULT_REWARD_DAYS,
};

/// Store operations that can be failed on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    CreateSubscription,
    CreatePayment,
    /// Inside an approval, after the payment checks passed
    ActivateSubscription,
    WriteSession,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    subscriptions: Vec<Subscription>,
    payments: Vec<Payment>,
    /// Highest payment id handed out by `next_id`
    payment_seq: i64,
    referrals: Vec<Referral>,
    sessions: HashMap<UserId, SessionRecord>,
}

impl Tables {
    fn subscription_mut(&mut self, id: SubscriptionId) -> Option<&mut Subscription> {
        self.subscriptions.iter_mut().find(|s| s.id == id)
    }

    fn payment_mut(&mut self, id: PaymentId) -> Option<&mut Payment> {
        self.payments.iter_mut().find(|p| p.id == id)
    }

    fn with_user(&self, subscription: &Subscription) -> Option<SubscriptionWithUser> {
        let user = self.users.get(&subscription.user_id)?;
        Some(SubscriptionWithUser {
            subscription: subscription.clone(),
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            user_language: user.language,
        })
    }

    fn decide(
        &mut self,
        id: PaymentId,
        status: PaymentStatus,
        admin: UserId,
        at: DateTime<Utc>,
    ) -> RepoResult<Payment> {
        let payment = self
            .payment_mut(id)
            .ok_or(DomainError::PaymentNotFound(id))?;
        if payment.status.is_terminal() {
            return Err(DomainError::PaymentAlreadyProcessed {
                id,
                status: payment.status,
            });
        }
        payment.decide(status, admin, at);
        Ok(payment.clone())
    }

    /// Check that a decision on `id` would succeed without applying it
    fn check_pending(&self, id: PaymentId) -> RepoResult<&Payment> {
        let payment = self
            .payments
            .iter()
            .find(|p| p.id == id)
            .ok_or(DomainError::PaymentNotFound(id))?;
        if payment.status.is_terminal() {
            return Err(DomainError::PaymentAlreadyProcessed {
                id,
                status: payment.status,
            });
        }
        Ok(payment)
    }
}

/// Every store in one process-local value
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
    faults: Mutex<HashSet<Fault>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> RepoResult<MutexGuard<'_, Tables>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("store unavailable".to_string()));
        }
        Ok(self.tables.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn raw(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every store call fail with a database error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail the next `fault` operation with a database error
    pub fn fail_next(&self, fault: Fault) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(fault);
    }

    fn trip(&self, fault: Fault) -> RepoResult<()> {
        let tripped = self
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&fault);
        if tripped {
            return Err(DomainError::DatabaseError(format!("injected {fault:?} failure")));
        }
        Ok(())
    }

    pub fn all_users(&self) -> Vec<User> {
        self.raw().users.values().cloned().collect()
    }

    pub fn all_subscriptions(&self) -> Vec<Subscription> {
        self.raw().subscriptions.clone()
    }

    pub fn all_payments(&self) -> Vec<Payment> {
        self.raw().payments.clone()
    }

    pub fn all_referrals(&self) -> Vec<Referral> {
        self.raw().referrals.clone()
    }

    pub fn session_count(&self) -> usize {
        self.raw().sessions.len()
    }

    /// Insert a subscription as-is, assigning the next id
    pub fn seed_subscription(&self, mut subscription: Subscription) -> Subscription {
        let mut tables = self.raw();
        subscription.id = SubscriptionId::new(tables.subscriptions.len() as i64 + 1);
        tables.subscriptions.push(subscription.clone());
        subscription
    }

    /// Pretend a session was last written at `at`
    pub fn backdate_session(&self, user_id: UserId, at: DateTime<Utc>) {
        if let Some(record) = self.raw().sessions.get_mut(&user_id) {
            record.updated_at = at;
        }
    }

    /// Mark a referral completed
    pub fn complete_referral(&self, referred: UserId) {
        if let Some(referral) = self
            .raw()
            .referrals
            .iter_mut()
            .find(|r| r.referred_id == referred)
        {
            referral.status = ReferralStatus::Completed;
        }
    }

    /// Overwrite a stored session record, bypassing the typed payload
    pub fn put_raw_session(&self, user_id: UserId, step: &str, payload: serde_json::Value) {
        self.raw().sessions.insert(
            user_id,
            SessionRecord {
                user_id,
                step: step.to_string(),
                payload,
                updated_at: Utc::now(),
            },
        );
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .tables()?
            .users
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_by_referral_code(&self, code: &str) -> RepoResult<Option<User>> {
        Ok(self
            .tables()?
            .users
            .values()
            .find(|u| u.referral_code == code)
            .cloned())
    }

    async fn create(&self, user: &NewUser) -> RepoResult<User> {
        let mut tables = self.tables()?;
        if tables.users.contains_key(&user.id) {
            return Err(DomainError::UserAlreadyExists(user.id));
        }
        if user.email.is_some() && tables.users.values().any(|u| u.email == user.email) {
            return Err(DomainError::EmailAlreadyExists);
        }
        if tables
            .users
            .values()
            .any(|u| u.referral_code == user.referral_code)
        {
            return Err(DomainError::ReferralCodeTaken);
        }
        let created = user.clone().into_user(Utc::now());
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_field(&self, id: UserId, field: &UserField) -> RepoResult<()> {
        let mut tables = self.tables()?;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or(DomainError::UserNotFound(id))?;
        field.apply(user);
        Ok(())
    }

    async fn list(&self, active_only: bool, limit: Option<i64>) -> RepoResult<Vec<User>> {
        let tables = self.tables()?;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| !active_only || u.is_active)
            .cloned()
            .collect();
        users.sort_by(|a, b| b.joined_at.cmp(&a.joined_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = limit {
            users.truncate(limit.max(0) as usize);
        }
        Ok(users)
    }

    async fn stats(&self, since: DateTime<Utc>) -> RepoResult<UserStats> {
        let tables = self.tables()?;
        let users = tables.users.values();
        Ok(UserStats {
            total: users.len() as i64,
            new_this_week: tables.users.values().filter(|u| u.joined_at > since).count() as i64,
            active: tables.users.values().filter(|u| u.is_active).count() as i64,
        })
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn create(&self, subscription: &NewSubscription) -> RepoResult<Subscription> {
        self.trip(Fault::CreateSubscription)?;
        let mut tables = self.tables()?;
        let id = SubscriptionId::new(tables.subscriptions.len() as i64 + 1);
        let created = subscription.clone().into_subscription(id, Utc::now());
        tables.subscriptions.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: SubscriptionId) -> RepoResult<Option<Subscription>> {
        Ok(self
            .tables()?
            .subscriptions
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn find_active(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Subscription>> {
        Ok(self
            .tables()?
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_active_at(now))
            .max_by_key(|s| (s.expiry_date, s.id))
            .cloned())
    }

    async fn expire_overdue(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let mut tables = self.tables()?;
        let mut expired = 0;
        for subscription in &mut tables.subscriptions {
            if subscription.status == SubscriptionStatus::Active
                && subscription.expiry_date.is_some_and(|e| e < now)
            {
                subscription.status = SubscriptionStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn find_expiring(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> RepoResult<Vec<SubscriptionWithUser>> {
        let tables = self.tables()?;
        let mut rows: Vec<_> = tables
            .subscriptions
            .iter()
            .filter(|s| {
                s.status == SubscriptionStatus::Active
                    && s.expiry_date.is_some_and(|e| e > now && e <= until)
            })
            .filter_map(|s| tables.with_user(s))
            .collect();
        rows.sort_by_key(|r| (r.subscription.expiry_date, r.subscription.id));
        Ok(rows)
    }

    async fn find_recently_expired(
        &self,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> RepoResult<Vec<SubscriptionWithUser>> {
        let tables = self.tables()?;
        let mut rows: Vec<_> = tables
            .subscriptions
            .iter()
            .filter(|s| {
                s.status == SubscriptionStatus::Expired
                    && s.expiry_date.is_some_and(|e| e > since && e < now)
            })
            .filter_map(|s| tables.with_user(s))
            .collect();
        rows.sort_by_key(|r| (r.subscription.expiry_date, r.subscription.id));
        Ok(rows)
    }

    async fn service_stats(&self, now: DateTime<Utc>) -> RepoResult<Vec<ServiceStats>> {
        let tables = self.tables()?;
        let mut stats: Vec<ServiceStats> = Vec::new();
        for subscription in &tables.subscriptions {
            let index = match stats.iter().position(|s| s.service == subscription.service) {
                Some(index) => index,
                None => {
                    stats.push(ServiceStats {
                        service: subscription.service,
                        active_subscriptions: 0,
                        revenue: Money::ZERO,
                    });
                    stats.len() - 1
                }
            };
            if subscription.is_active_at(now) {
                stats[index].active_subscriptions += 1;
            }
            let revenue = tables
                .payments
                .iter()
                .filter(|p| {
                    p.subscription_id == subscription.id && p.status == PaymentStatus::Approved
                })
                .fold(Money::ZERO, |acc, p| acc + p.amount);
            stats[index].revenue = stats[index].revenue + revenue;
        }
        stats.sort_by_key(|s| s.service.as_str());
        Ok(stats)
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn next_id(&self) -> RepoResult<PaymentId> {
        let mut tables = self.tables()?;
        tables.payment_seq += 1;
        Ok(PaymentId::new(tables.payment_seq))
    }

    async fn create(&self, payment: &NewPayment) -> RepoResult<Payment> {
        self.trip(Fault::CreatePayment)?;
        let mut tables = self.tables()?;
        if tables.payments.iter().any(|p| p.id == payment.id) {
            return Err(DomainError::DatabaseError(format!(
                "duplicate payment id {}",
                payment.id
            )));
        }
        let created = payment.clone().into_payment(Utc::now());
        tables.payments.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: PaymentId) -> RepoResult<Option<Payment>> {
        Ok(self
            .tables()?
            .payments
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn approve(&self, id: PaymentId, admin: UserId, at: DateTime<Utc>) -> RepoResult<Approval> {
        let mut tables = self.tables()?;
        let subscription_id = tables.check_pending(id)?.subscription_id;
        let subscription = tables
            .subscriptions
            .iter()
            .find(|s| s.id == subscription_id)
            .ok_or(DomainError::SubscriptionNotFound(subscription_id))?;
        if subscription.status != SubscriptionStatus::Pending {
            return Err(DomainError::SubscriptionNotPending(subscription_id));
        }
        let expiry = subscription.expiry_from(at);
        self.trip(Fault::ActivateSubscription)?;

        // Both checks passed; apply the two updates together
        let payment = tables.decide(id, PaymentStatus::Approved, admin, at)?;
        let subscription = tables
            .subscription_mut(subscription_id)
            .ok_or(DomainError::SubscriptionNotFound(subscription_id))?;
        subscription.status = SubscriptionStatus::Active;
        subscription.start_date = Some(at);
        subscription.expiry_date = Some(expiry);
        Ok(Approval {
            payment,
            subscription: subscription.clone(),
        })
    }

    async fn reject(&self, id: PaymentId, admin: UserId, at: DateTime<Utc>) -> RepoResult<Payment> {
        self.tables()?.decide(id, PaymentStatus::Rejected, admin, at)
    }

    async fn list_pending(&self, limit: i64) -> RepoResult<Vec<PendingPayment>> {
        let tables = self.tables()?;
        let mut pending: Vec<PendingPayment> = tables
            .payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Pending)
            .filter_map(|p| {
                let user = tables.users.get(&p.user_id)?;
                let subscription = tables
                    .subscriptions
                    .iter()
                    .find(|s| s.id == p.subscription_id)?;
                Some(PendingPayment {
                    payment: p.clone(),
                    user_name: user.name.clone(),
                    user_email: user.email.clone(),
                    service: subscription.service,
                    duration: subscription.duration,
                })
            })
            .collect();
        pending.sort_by(|a, b| {
            b.payment
                .created_at
                .cmp(&a.payment.created_at)
                .then(b.payment.id.cmp(&a.payment.id))
        });
        pending.truncate(limit.max(0) as usize);
        Ok(pending)
    }

    async fn count_pending(&self) -> RepoResult<i64> {
        Ok(self
            .tables()?
            .payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Pending)
            .count() as i64)
    }

    async fn revenue_stats(&self, since: Option<DateTime<Utc>>) -> RepoResult<RevenueStats> {
        let tables = self.tables()?;
        let approved: Vec<&Payment> = tables
            .payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Approved)
            .filter(|p| match since {
                Some(since) => p.verified_at.is_some_and(|at| at > since),
                None => true,
            })
            .collect();
        let total = approved.iter().fold(Money::ZERO, |acc, p| acc + p.amount);
        Ok(RevenueStats::from_total(total, approved.len() as i64))
    }
}

#[async_trait]
impl ReferralRepository for MemoryStore {
    async fn create(&self, referrer: UserId, referred: UserId) -> RepoResult<bool> {
        let mut tables = self.tables()?;
        if tables.referrals.iter().any(|r| r.referred_id == referred) {
            return Ok(false);
        }
        let id = ReferralId::new(tables.referrals.len() as i64 + 1);
        tables.referrals.push(Referral {
            id,
            referrer_id: referrer,
            referred_id: referred,
            reward_type: RewardType::Extension,
            reward_amount: DEFAULT_REWARD_DAYS,
            status: ReferralStatus::Pending,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn count_completed(&self, user_id: UserId) -> RepoResult<i64> {
        Ok(self
            .tables()?
            .referrals
            .iter()
            .filter(|r| r.referrer_id == user_id && r.status == ReferralStatus::Completed)
            .count() as i64)
    }

    async fn list_for_referrer(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> RepoResult<Vec<ReferralSummary>> {
        let tables = self.tables()?;
        let mut rows: Vec<ReferralSummary> = tables
            .referrals
            .iter()
            .filter(|r| r.referrer_id == user_id)
            .map(|r| ReferralSummary {
                referral: r.clone(),
                referred_name: tables
                    .users
                    .get(&r.referred_id)
                    .map_or_else(|| "Unknown".to_string(), |u| u.name.clone()),
            })
            .collect();
        rows.sort_by(|a, b| b.referral.created_at.cmp(&a.referral.created_at));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn count_for_referrer(&self, user_id: UserId) -> RepoResult<i64> {
        Ok(self
            .tables()?
            .referrals
            .iter()
            .filter(|r| r.referrer_id == user_id)
            .count() as i64)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, user_id: UserId) -> RepoResult<Option<SessionRecord>> {
        Ok(self.tables()?.sessions.get(&user_id).cloned())
    }

    async fn put(
        &self,
        user_id: UserId,
        step: &str,
        payload: &serde_json::Value,
    ) -> RepoResult<()> {
        self.trip(Fault::WriteSession)?;
        self.tables()?.sessions.insert(
            user_id,
            SessionRecord {
                user_id,
                step: step.to_string(),
                payload: payload.clone(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> RepoResult<()> {
        self.tables()?.sessions.remove(&user_id);
        Ok(())
    }

    async fn purge_stale(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        let mut tables = self.tables()?;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, record| record.updated_at >= cutoff);
        Ok((before - tables.sessions.len()) as u64)
    }
}
