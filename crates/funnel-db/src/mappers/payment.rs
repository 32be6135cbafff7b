//! Payment row -> entity mappers

use funnel_core::{DomainError, Money, Payment, PaymentId, PendingPayment, SubscriptionId, UserId};

use super::{duration_column, parse_column};
use crate::models::{PaymentModel, PendingPaymentModel};

impl TryFrom<PaymentModel> for Payment {
    type Error = DomainError;

    fn try_from(model: PaymentModel) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::new(model.id),
            user_id: UserId::new(model.user_id),
            subscription_id: SubscriptionId::new(model.subscription_id),
            payment_method: parse_column("payment_method", &model.payment_method)?,
            amount: Money::from_cents(model.amount_cents),
            tx_hash: model.tx_hash,
            order_id: model.order_id,
            receipt_path: model.receipt_path,
            status: parse_column("status", &model.status)?,
            verified_by: model.verified_by.map(UserId::new),
            verified_at: model.verified_at,
            created_at: model.created_at,
        })
    }
}

impl TryFrom<PendingPaymentModel> for PendingPayment {
    type Error = DomainError;

    fn try_from(model: PendingPaymentModel) -> Result<Self, Self::Error> {
        Ok(PendingPayment {
            payment: Payment::try_from(model.payment)?,
            user_name: model.user_name,
            user_email: model.user_email,
            service: parse_column("service_type", &model.service_type)?,
            duration: duration_column(model.duration_months)?,
        })
    }
}
