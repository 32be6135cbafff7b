//! Subscription entity - a purchased, time-boxed service

use chrono::{DateTime, Utc};

use crate::value_objects::{
    Language, Money, PaymentMethod, PlanDuration, ServiceKey, SubscriptionId, UnknownValue, UserId,
};

/// Subscription lifecycle: `pending -> active -> expired`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Expired,
}

impl SubscriptionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            other => Err(UnknownValue::new("subscription status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub service: ServiceKey,
    pub duration: PlanDuration,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub status: SubscriptionStatus,
    /// Set only on activation
    pub start_date: Option<DateTime<Utc>>,
    /// Set only on activation
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Active and not yet past its expiry
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.expiry_date.is_some_and(|e| e > now)
    }

    /// Whole days until expiry, zero once passed
    pub fn days_left(&self, now: DateTime<Utc>) -> i64 {
        self.expiry_date
            .map_or(0, |e| (e - now).num_days().max(0))
    }

    /// Expiry for an activation starting at `start`
    pub fn expiry_from(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start + self.duration.period()
    }
}

/// Insert payload; new subscriptions always start `pending`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub user_id: UserId,
    pub service: ServiceKey,
    pub duration: PlanDuration,
    pub amount: Money,
    pub payment_method: PaymentMethod,
}

impl NewSubscription {
    pub fn into_subscription(self, id: SubscriptionId, created_at: DateTime<Utc>) -> Subscription {
        Subscription {
            id,
            user_id: self.user_id,
            service: self.service,
            duration: self.duration,
            amount: self.amount,
            payment_method: self.payment_method,
            status: SubscriptionStatus::Pending,
            start_date: None,
            expiry_date: None,
            created_at,
        }
    }
}

/// Subscription joined with the owner's contact details, used by the sweeps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionWithUser {
    pub subscription: Subscription,
    pub user_name: String,
    pub user_email: Option<String>,
    pub user_language: Language,
}

/// Per-service aggregate for the admin service stats view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    pub service: ServiceKey,
    pub active_subscriptions: i64,
    pub revenue: Money,
}
