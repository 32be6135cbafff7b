//! User row -> entity mapper

use funnel_core::{DomainError, User, UserId, UserStats};

use super::parse_column;
use crate::models::{UserModel, UserStatsModel};

impl TryFrom<UserModel> for User {
    type Error = DomainError;

    fn try_from(model: UserModel) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId::new(model.user_id),
            name: model.name,
            email: model.email,
            phone: model.phone,
            country: model.country,
            language: parse_column("language", &model.language)?,
            referral_code: model.referral_code,
            referred_by: model.referred_by.map(UserId::new),
            telegram_username: model.telegram_username,
            privacy_allowed: model.privacy_allowed,
            is_active: model.is_active,
            joined_at: model.joined_at,
        })
    }
}

impl From<UserStatsModel> for UserStats {
    fn from(model: UserStatsModel) -> Self {
        UserStats {
            total: model.total,
            new_this_week: model.new_this_week,
            active: model.active,
        }
    }
}
