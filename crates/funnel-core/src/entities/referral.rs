//! Referral entity and referral-code generation

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::value_objects::{ReferralId, UnknownValue, UserId};

/// Length of a referral code in hex characters
pub const REFERRAL_CODE_LEN: usize = 8;

/// Days of subscription extension a referrer is promised per referral
pub const DEFAULT_REWARD_DAYS: i32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferralStatus {
    Pending,
    Completed,
}

impl ReferralStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for ReferralStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownValue::new("referral status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewardType {
    Extension,
}

impl RewardType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Extension => "extension",
        }
    }
}

impl std::str::FromStr for RewardType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extension" => Ok(Self::Extension),
            other => Err(UnknownValue::new("reward type", other)),
        }
    }
}

/// Edge from a referrer to the user they brought in (one per referred user)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Referral {
    pub id: ReferralId,
    pub referrer_id: UserId,
    pub referred_id: UserId,
    pub reward_type: RewardType,
    pub reward_amount: i32,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
}

/// Referral joined with the referred user's name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralSummary {
    pub referral: Referral,
    pub referred_name: String,
}

/// Derive a referral code from the user's identity and registration time.
///
/// `attempt` is mixed in on retries after a unique-constraint collision; the
/// first attempt hashes exactly `"{user_id}_{timestamp}"`.
pub fn generate_referral_code(user_id: UserId, at: DateTime<Utc>, attempt: u32) -> String {
    let seed = if attempt == 0 {
        format!("{user_id}_{}", at.timestamp_micros())
    } else {
        format!("{user_id}_{}_{attempt}", at.timestamp_micros())
    };

    let digest = Sha256::digest(seed.as_bytes());
    let mut code = hex::encode_upper(digest);
    code.truncate(REFERRAL_CODE_LEN);
    code
}
