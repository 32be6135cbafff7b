//! Store traits (ports)

mod clock;
mod repositories;
mod session;

pub use clock::{Clock, SystemClock};
pub use repositories::{
    PaymentRepository, ReferralRepository, RepoResult, SubscriptionRepository, UserRepository,
};
pub use session::{SessionRecord, SessionStore};
