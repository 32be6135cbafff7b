//! Referral row -> entity mappers

use funnel_core::{DomainError, Referral, ReferralId, ReferralSummary, UserId};

use super::parse_column;
use crate::models::{ReferralModel, ReferralSummaryModel};

impl TryFrom<ReferralModel> for Referral {
    type Error = DomainError;

    fn try_from(model: ReferralModel) -> Result<Self, Self::Error> {
        Ok(Referral {
            id: ReferralId::new(model.id),
            referrer_id: UserId::new(model.referrer_id),
            referred_id: UserId::new(model.referred_id),
            reward_type: parse_column("reward_type", &model.reward_type)?,
            reward_amount: model.reward_amount,
            status: parse_column("status", &model.status)?,
            created_at: model.created_at,
        })
    }
}

impl TryFrom<ReferralSummaryModel> for ReferralSummary {
    type Error = DomainError;

    fn try_from(model: ReferralSummaryModel) -> Result<Self, Self::Error> {
        Ok(ReferralSummary {
            referral: Referral::try_from(model.referral)?,
            referred_name: model.referred_name,
        })
    }
}
