//! Supported interface languages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::UnknownValue;

/// User-selectable language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Am,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Am];

    /// ISO 639-1 code stored in the database and used in choice tags
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Am => "am",
        }
    }

    /// Native name shown on the language picker
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::En => "🇺🇸 English",
            Self::Am => "🇪🇹 አማርኛ",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::En),
            "am" => Ok(Self::Am),
            other => Err(UnknownValue::new("language", other)),
        }
    }
}
