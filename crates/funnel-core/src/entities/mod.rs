//! Domain entities - core business objects

mod payment;
mod referral;
mod subscription;
mod user;

pub use payment::{Approval, NewPayment, Payment, PaymentStatus, PendingPayment, RevenueStats};
pub use referral::{
    generate_referral_code, Referral, ReferralStatus, ReferralSummary, RewardType,
    DEFAULT_REWARD_DAYS, REFERRAL_CODE_LEN,
};
pub use subscription::{
    NewSubscription, ServiceStats, Subscription, SubscriptionStatus, SubscriptionWithUser,
};
pub use user::{NewUser, User, UserField, UserStats};
