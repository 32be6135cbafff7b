//! User entity - a registered chat user

use chrono::{DateTime, Utc};

use crate::value_objects::{Language, UserId};

/// Registered user, keyed by chat identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub language: Language,
    pub referral_code: String,
    pub referred_by: Option<UserId>,
    pub telegram_username: Option<String>,
    pub privacy_allowed: bool,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

impl User {
    /// Referral deep link for this user
    pub fn referral_link(&self, bot_username: &str) -> String {
        format!(
            "https://t.me/{bot_username}?start=ref_{}",
            self.referral_code
        )
    }

    /// `@handle`, or `N/A` when the user has none
    pub fn handle(&self) -> String {
        self.telegram_username
            .as_deref()
            .map_or_else(|| "N/A".to_string(), |h| format!("@{h}"))
    }
}

/// Data required to insert a user; the referral code is generated by the
/// caller and is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub language: Language,
    pub referral_code: String,
    pub referred_by: Option<UserId>,
    pub telegram_username: Option<String>,
    pub privacy_allowed: bool,
}

impl NewUser {
    /// Materialize the row as the store will return it
    pub fn into_user(self, joined_at: DateTime<Utc>) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            country: self.country,
            language: self.language,
            referral_code: self.referral_code,
            referred_by: self.referred_by,
            telegram_username: self.telegram_username,
            privacy_allowed: self.privacy_allowed,
            is_active: true,
            joined_at,
        }
    }
}

/// A single mutable profile column
///
/// `referral_code` and `referred_by` have no variant: both are fixed
/// at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserField {
    Name(String),
    Email(Option<String>),
    Phone(String),
    Country(String),
    Language(Language),
    TelegramUsername(Option<String>),
    Active(bool),
}

impl UserField {
    /// Column name in the users table
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::Email(_) => "email",
            Self::Phone(_) => "phone",
            Self::Country(_) => "country",
            Self::Language(_) => "language",
            Self::TelegramUsername(_) => "telegram_username",
            Self::Active(_) => "is_active",
        }
    }

    /// Apply the change to an in-memory copy
    pub fn apply(&self, user: &mut User) {
        match self {
            Self::Name(v) => user.name.clone_from(v),
            Self::Email(v) => user.email.clone_from(v),
            Self::Phone(v) => user.phone = Some(v.clone()),
            Self::Country(v) => user.country = Some(v.clone()),
            Self::Language(v) => user.language = *v,
            Self::TelegramUsername(v) => user.telegram_username.clone_from(v),
            Self::Active(v) => user.is_active = *v,
        }
    }
}

/// Aggregate user counts for the admin panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub total: i64,
    pub new_this_week: i64,
    pub active: i64,
}
