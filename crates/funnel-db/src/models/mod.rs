//! Database models - SQLx-compatible structs for PostgreSQL tables

mod payment;
mod referral;
mod session;
mod subscription;
mod user;

pub use payment::{PaymentModel, PendingPaymentModel};
pub use referral::{ReferralModel, ReferralSummaryModel};
pub use session::SessionModel;
pub use subscription::{ServiceStatsModel, SubscriptionModel, SubscriptionWithUserModel};
pub use user::{UserModel, UserStatsModel};
