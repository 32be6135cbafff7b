//! Service catalog keys and plan durations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::UnknownValue;

/// One of the fixed catalog offerings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKey {
    Mentorship,
    Masterclass,
    FaceToFace,
    VipSignals,
    OneToOne,
}

impl ServiceKey {
    pub const ALL: [ServiceKey; 5] = [
        ServiceKey::Mentorship,
        ServiceKey::Masterclass,
        ServiceKey::FaceToFace,
        ServiceKey::VipSignals,
        ServiceKey::OneToOne,
    ];

    /// Key used in choice tags, config variables and the database.
    /// Some keys contain underscores, so tag parsers must not split on them.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mentorship => "mentorship",
            Self::Masterclass => "masterclass",
            Self::FaceToFace => "face_to_face",
            Self::VipSignals => "vip_signals",
            Self::OneToOne => "one_to_one",
        }
    }

    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Mentorship => "👨‍🏫",
            Self::Masterclass => "🎓",
            Self::FaceToFace => "🤝",
            Self::VipSignals => "📈",
            Self::OneToOne => "💬",
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKey {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownValue::new("service", s))
    }
}

/// Subscription length tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum PlanDuration {
    OneMonth,
    ThreeMonths,
    SixMonths,
}

impl PlanDuration {
    pub const ALL: [PlanDuration; 3] = [
        PlanDuration::OneMonth,
        PlanDuration::ThreeMonths,
        PlanDuration::SixMonths,
    ];

    /// Days per billed month
    pub const DAYS_PER_MONTH: i64 = 30;

    pub const fn months(self) -> i32 {
        match self {
            Self::OneMonth => 1,
            Self::ThreeMonths => 3,
            Self::SixMonths => 6,
        }
    }

    pub fn from_months(months: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.months() == months)
    }

    /// Length of the activation window
    pub fn period(self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.months()) * Self::DAYS_PER_MONTH)
    }
}

impl fmt::Display for PlanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.months())
    }
}

impl TryFrom<i32> for PlanDuration {
    type Error = UnknownValue;

    fn try_from(months: i32) -> Result<Self, Self::Error> {
        Self::from_months(months).ok_or_else(|| UnknownValue::new("duration", &months.to_string()))
    }
}

impl From<PlanDuration> for i32 {
    fn from(d: PlanDuration) -> Self {
        d.months()
    }
}

impl FromStr for PlanDuration {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i32>()
            .ok()
            .and_then(Self::from_months)
            .ok_or_else(|| UnknownValue::new("duration", s))
    }
}
