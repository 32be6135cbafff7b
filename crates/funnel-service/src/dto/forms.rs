//! Registration form
//!
//! Every field was already checked by its own wizard step. The form is the
//! final gate before the user row is written, so a draft tampered with in
//! the session store cannot reach the database.

use funnel_core::{Language, NewUser, UserId};
use serde::Deserialize;
use validator::Validate;

use crate::conversation::RegistrationDraft;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegistrationForm {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 7, max = 20, message = "Phone must be 7-20 characters"))]
    pub phone: String,

    #[validate(length(min = 2, max = 100, message = "Country must be 2-100 characters"))]
    pub country: String,

    #[validate(length(min = 1, max = 32, message = "Username must be 1-32 characters"))]
    pub telegram_username: Option<String>,

    pub language: Language,
    pub privacy_allowed: bool,
}

impl RegistrationForm {
    pub fn from_draft(draft: &RegistrationDraft, phone: &str, country: &str) -> Self {
        Self {
            name: draft.name.clone(),
            email: draft.email.clone(),
            phone: phone.to_string(),
            country: country.to_string(),
            telegram_username: draft.telegram_username.clone(),
            language: draft.language.unwrap_or_default(),
            privacy_allowed: draft.privacy_allowed,
        }
    }

    pub fn into_new_user(
        self,
        id: UserId,
        referral_code: String,
        referred_by: Option<UserId>,
    ) -> NewUser {
        NewUser {
            id,
            name: self.name,
            email: self.email,
            phone: Some(self.phone),
            country: Some(self.country),
            language: self.language,
            referral_code,
            referred_by,
            telegram_username: self.telegram_username,
            privacy_allowed: self.privacy_allowed,
        }
    }
}
