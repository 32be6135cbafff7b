//! Subscription row -> entity mappers

use funnel_core::{
    DomainError, Money, ServiceStats, Subscription, SubscriptionId, SubscriptionWithUser, UserId,
};

use super::{duration_column, parse_column};
use crate::models::{ServiceStatsModel, SubscriptionModel, SubscriptionWithUserModel};

impl TryFrom<SubscriptionModel> for Subscription {
    type Error = DomainError;

    fn try_from(model: SubscriptionModel) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::new(model.id),
            user_id: UserId::new(model.user_id),
            service: parse_column("service_type", &model.service_type)?,
            duration: duration_column(model.duration_months)?,
            amount: Money::from_cents(model.amount_cents),
            payment_method: parse_column("payment_method", &model.payment_method)?,
            status: parse_column("status", &model.status)?,
            start_date: model.start_date,
            expiry_date: model.expiry_date,
            created_at: model.created_at,
        })
    }
}

impl TryFrom<SubscriptionWithUserModel> for SubscriptionWithUser {
    type Error = DomainError;

    fn try_from(model: SubscriptionWithUserModel) -> Result<Self, Self::Error> {
        Ok(SubscriptionWithUser {
            subscription: Subscription::try_from(model.subscription)?,
            user_name: model.user_name,
            user_email: model.user_email,
            user_language: parse_column("language", &model.user_language)?,
        })
    }
}

impl TryFrom<ServiceStatsModel> for ServiceStats {
    type Error = DomainError;

    fn try_from(model: ServiceStatsModel) -> Result<Self, Self::Error> {
        Ok(ServiceStats {
            service: parse_column("service_type", &model.service_type)?,
            active_subscriptions: model.active_subscriptions,
            revenue: Money::from_cents(model.revenue_cents),
        })
    }
}
