//! Email bodies for the lifecycle events that send mail

use funnel_core::{Money, PlanDuration};

use super::EmailMessage;

pub fn welcome(to: &str, name: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Welcome aboard! 🎉".to_string(),
        body: format!(
            "Hi {name},\n\n\
             Your registration is complete. You can now browse our services, \
             pick a plan and pay right from the chat.\n\n\
             Invite friends with your referral link to earn discounts.\n\n\
             See you inside!"
        ),
    }
}

pub fn payment_confirmation(
    to: &str,
    name: &str,
    service: &str,
    duration: PlanDuration,
    amount: Money,
) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Payment confirmed - {service}"),
        body: format!(
            "Hi {name},\n\n\
             Your payment was approved and your subscription is now active.\n\n\
             Service: {service}\n\
             Duration: {duration} month(s)\n\
             Amount: {amount}\n\n\
             Thank you for subscribing!"
        ),
    }
}

pub fn payment_rejected(to: &str, name: &str, service: &str, amount: Money) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Payment not approved - {service}"),
        body: format!(
            "Hi {name},\n\n\
             We could not verify your payment of {amount} for {service}.\n\
             Please check the receipt and try again, or contact support if \
             you believe this is a mistake."
        ),
    }
}

pub fn expiry_warning(to: &str, name: &str, service: &str, days_left: i64) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Subscription expiring soon - {service}"),
        body: format!(
            "Hi {name},\n\n\
             Your {service} subscription expires in {days_left} day(s).\n\
             Renew from the bot to keep your access without interruption."
        ),
    }
}

pub fn renewal_reminder(to: &str, name: &str, service: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("We miss you - renew {service}"),
        body: format!(
            "Hi {name},\n\n\
             Your {service} subscription has ended. Open the bot and choose \
             a plan whenever you are ready to continue."
        ),
    }
}
