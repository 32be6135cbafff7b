//! Error handling utilities for repositories

use funnel_core::{DomainError, PaymentId, SubscriptionId, UserId};
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Map a unique violation to a domain conflict chosen by constraint name
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce(Option<&str>) -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique(db_err.constraint());
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// Conflict raised by an insert into `users`
pub fn user_conflict(id: UserId, constraint: Option<&str>) -> DomainError {
    match constraint {
        Some("users_email_key") => DomainError::EmailAlreadyExists,
        Some("users_referral_code_key") => DomainError::ReferralCodeTaken,
        _ => DomainError::UserAlreadyExists(id),
    }
}

pub fn user_not_found(id: UserId) -> DomainError {
    DomainError::UserNotFound(id)
}

pub fn subscription_not_found(id: SubscriptionId) -> DomainError {
    DomainError::SubscriptionNotFound(id)
}

pub fn payment_not_found(id: PaymentId) -> DomainError {
    DomainError::PaymentNotFound(id)
}
