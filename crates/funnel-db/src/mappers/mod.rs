//! Row to entity mappers
//!
//! Text columns holding enumerations are parsed on the way out; a value the
//! domain does not know is reported as a database error rather than guessed.

mod payment;
mod referral;
mod session;
mod subscription;
mod user;

use std::str::FromStr;

use funnel_core::DomainError;

/// Parse an enumerated column, naming the column on failure
pub(crate) fn parse_column<T>(column: &str, value: &str) -> Result<T, DomainError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| DomainError::DatabaseError(format!("corrupt {column} column: {e}")))
}

pub(crate) fn duration_column(months: i32) -> Result<funnel_core::PlanDuration, DomainError> {
    funnel_core::PlanDuration::try_from(months)
        .map_err(|e| DomainError::DatabaseError(format!("corrupt duration_months column: {e}")))
}
