//! Numeric identifiers
//!
//! `UserId` is the chat identity handed to us by the transport; the other ids
//! are database-assigned serials. All of them are plain `i64` newtypes so they
//! cannot be mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error when parsing an id from a choice tag or config value
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("invalid id format")]
    InvalidFormat,
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[inline]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            #[inline]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| IdParseError::InvalidFormat)
            }
        }
    };
}

id_type!(
    /// Chat identity of a user (also the primary key of the users table)
    UserId
);
id_type!(
    /// Subscription row id
    SubscriptionId
);
id_type!(
    /// Payment row id
    PaymentId
);
id_type!(
    /// Referral row id
    ReferralId
);
