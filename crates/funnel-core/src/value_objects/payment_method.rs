//! Accepted payment channels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::UnknownValue;

/// How the user pays; all channels are verified manually by an admin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Binance,
    Cbe,
    Telebirr,
    Abyssinia,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Binance,
        PaymentMethod::Cbe,
        PaymentMethod::Telebirr,
        PaymentMethod::Abyssinia,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::Cbe => "cbe",
            Self::Telebirr => "telebirr",
            Self::Abyssinia => "abyssinia",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Binance => "Binance (Crypto)",
            Self::Cbe => "CBE Bank",
            Self::Telebirr => "Telebirr",
            Self::Abyssinia => "Abyssinia Bank",
        }
    }

    /// Crypto payments fork into a Pay ID or wallet-address sub-flow
    pub const fn is_crypto(self) -> bool {
        matches!(self, Self::Binance)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binance" => Ok(Self::Binance),
            "cbe" => Ok(Self::Cbe),
            "telebirr" => Ok(Self::Telebirr),
            // older keyboards sent `payment_other_bank`
            "abyssinia" | "other_bank" => Ok(Self::Abyssinia),
            other => Err(UnknownValue::new("payment method", other)),
        }
    }
}
