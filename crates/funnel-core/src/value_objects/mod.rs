//! Value objects - immutable types that represent domain concepts

mod ids;
mod language;
mod money;
mod payment_method;
mod service;

pub use ids::{IdParseError, PaymentId, ReferralId, SubscriptionId, UserId};
pub use language::Language;
pub use money::Money;
pub use payment_method::PaymentMethod;
pub use service::{PlanDuration, ServiceKey};

/// Error when a stored or user-supplied code names no known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownValue {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
