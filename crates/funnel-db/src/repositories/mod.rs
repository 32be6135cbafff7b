//! Repository implementations
//!
//! PostgreSQL implementations of the store traits defined in funnel-core.
//! Each repository handles database operations for a specific domain entity.

mod error;
mod payment;
mod referral;
mod session;
mod subscription;
mod user;

pub use payment::PgPaymentRepository;
pub use referral::PgReferralRepository;
pub use session::PgSessionStore;
pub use subscription::PgSubscriptionRepository;
pub use user::PgUserRepository;
