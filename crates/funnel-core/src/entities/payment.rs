//! Payment entity - proof of payment awaiting admin review

use chrono::{DateTime, Utc};

use super::subscription::Subscription;
use crate::value_objects::{
    Money, PaymentId, PaymentMethod, PlanDuration, ServiceKey, SubscriptionId, UnknownValue,
    UserId,
};

/// Review state: `pending -> approved | rejected`, both terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

impl PaymentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownValue::new("payment status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub subscription_id: SubscriptionId,
    pub payment_method: PaymentMethod,
    pub amount: Money,
    /// On-chain transaction hash (wallet transfers)
    pub tx_hash: Option<String>,
    /// Binance Pay order id
    pub order_id: Option<String>,
    pub receipt_path: Option<String>,
    pub status: PaymentStatus,
    pub verified_by: Option<UserId>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Record an admin decision. Callers must have checked `status` first;
    /// stores enforce the same rule with a conditional update.
    pub fn decide(&mut self, status: PaymentStatus, admin: UserId, at: DateTime<Utc>) {
        self.status = status;
        self.verified_by = Some(admin);
        self.verified_at = Some(at);
    }
}

/// Insert payload. The id is reserved up front so the receipt file, whose
/// name carries it, exists before the row does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub subscription_id: SubscriptionId,
    pub payment_method: PaymentMethod,
    pub amount: Money,
    pub tx_hash: Option<String>,
    pub order_id: Option<String>,
    pub receipt_path: String,
}

impl NewPayment {
    pub fn into_payment(self, created_at: DateTime<Utc>) -> Payment {
        Payment {
            id: self.id,
            user_id: self.user_id,
            subscription_id: self.subscription_id,
            payment_method: self.payment_method,
            amount: self.amount,
            tx_hash: self.tx_hash,
            order_id: self.order_id,
            receipt_path: Some(self.receipt_path),
            status: PaymentStatus::Pending,
            verified_by: None,
            verified_at: None,
            created_at,
        }
    }
}

/// Result of an approval: the payment and the subscription it activated,
/// committed together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    pub payment: Payment,
    pub subscription: Subscription,
}

/// Pending payment joined with user and subscription for the review queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPayment {
    pub payment: Payment,
    pub user_name: String,
    pub user_email: Option<String>,
    pub service: ServiceKey,
    pub duration: PlanDuration,
}

/// Aggregate over approved payments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevenueStats {
    pub total: Money,
    pub count: i64,
    pub average: Money,
}

impl RevenueStats {
    pub fn from_total(total: Money, count: i64) -> Self {
        let average = if count > 0 {
            Money::from_cents(total.cents() / count)
        } else {
            Money::ZERO
        };
        Self {
            total,
            count,
            average,
        }
    }
}
