//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::entities::PaymentStatus;
use crate::value_objects::{PaymentId, SubscriptionId, UserId};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(SubscriptionId),

    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("User already registered: {0}")]
    UserAlreadyExists(UserId),

    #[error("Email already in use")]
    EmailAlreadyExists,

    #[error("Referral code already in use")]
    ReferralCodeTaken,

    #[error("Payment {id} already {status}")]
    PaymentAlreadyProcessed { id: PaymentId, status: PaymentStatus },

    #[error("Subscription {0} is not pending")]
    SubscriptionNotPending(SubscriptionId),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Stable error code for logs
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::SubscriptionNotFound(_) => "UNKNOWN_SUBSCRIPTION",
            Self::PaymentNotFound(_) => "UNKNOWN_PAYMENT",

            // Conflict
            Self::UserAlreadyExists(_) => "USER_ALREADY_EXISTS",
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::ReferralCodeTaken => "REFERRAL_CODE_TAKEN",
            Self::PaymentAlreadyProcessed { .. } => "PAYMENT_ALREADY_PROCESSED",
            Self::SubscriptionNotPending(_) => "SUBSCRIPTION_NOT_PENDING",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_) | Self::SubscriptionNotFound(_) | Self::PaymentNotFound(_)
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::UserAlreadyExists(_)
                | Self::EmailAlreadyExists
                | Self::ReferralCodeTaken
                | Self::PaymentAlreadyProcessed { .. }
                | Self::SubscriptionNotPending(_)
        )
    }

    /// Storage failures; the caller may retry the whole operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DatabaseError(_) | Self::CacheError(_))
    }
}
