//! Flow services
//!
//! Each service groups the transitions of one flow. Transitions take the
//! current [`Turn`](crate::conversation::Turn) and return an
//! [`Outcome`](crate::conversation::Outcome); none of them talk to the
//! transport directly.

pub mod account;
pub mod admin;
pub mod context;
pub mod error;
pub mod purchase;
pub mod registration;
pub mod sweep;

pub use account::AccountService;
pub use admin::AdminService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use purchase::PurchaseService;
pub use registration::RegistrationService;
pub use sweep::{SweepReport, SweepService};

use funnel_core::Language;

use crate::conversation::Outcome;
use crate::i18n::t;
use crate::keyboards;

/// Reply to a registered-only action from someone who has not registered
pub(crate) fn please_register(lang: Language) -> Outcome {
    Outcome::stay().answer(t(lang, "please_register"), Some(keyboards::welcome(lang)))
}
