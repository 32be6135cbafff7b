//! # funnel-core
//!
//! Domain layer for the subscription funnel: users, subscriptions, payments,
//! referrals, the session record, and the store traits the conversation
//! engine depends on. No infrastructure dependencies live here.

pub mod entities;
pub mod error;
pub mod pricing;
pub mod traits;
pub mod validation;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    generate_referral_code, Approval, NewPayment, NewSubscription, NewUser, Payment, PaymentStatus,
    PendingPayment, Referral, ReferralStatus, ReferralSummary, RevenueStats, RewardType,
    ServiceStats, Subscription, SubscriptionStatus, SubscriptionWithUser, User, UserField,
    UserStats, DEFAULT_REWARD_DAYS, REFERRAL_CODE_LEN,
};
pub use error::DomainError;
pub use pricing::{referral_discount, savings, PriceQuote};
pub use traits::{
    Clock, PaymentRepository, ReferralRepository, RepoResult, SessionRecord, SessionStore,
    SubscriptionRepository, SystemClock, UserRepository,
};
pub use validation::FieldError;
pub use value_objects::{
    Language, Money, PaymentId, PaymentMethod, PlanDuration, ReferralId, ServiceKey,
    SubscriptionId, UnknownValue, UserId,
};
