//! Price and discount calculation

use serde::{Deserialize, Serialize};

use crate::value_objects::Money;

/// Completed referrals needed per dollar of discount
pub const REFERRALS_PER_DOLLAR: i64 = 100;

/// One dollar per hundred completed referrals
pub fn referral_discount(completed_referrals: i64) -> Money {
    Money::from_dollars(completed_referrals.max(0) / REFERRALS_PER_DOLLAR)
}

/// What a multi-month tier saves over paying monthly
pub fn savings(monthly_price: Money, tier_price: Money, months: i32) -> Money {
    monthly_price * i64::from(months) - tier_price
}

/// Price breakdown carried through the payment flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub original_amount: Money,
    pub service_discount: Money,
    pub referral_discount: Money,
    pub amount: Money,
}

impl PriceQuote {
    /// `max(listed - serviceDiscount - referralDiscount, 0)`
    pub fn new(listed: Money, service_discount: Money, completed_referrals: i64) -> Self {
        let referral_discount = referral_discount(completed_referrals);
        Self {
            original_amount: listed,
            service_discount,
            referral_discount,
            amount: listed.saturating_sub_floor(service_discount + referral_discount),
        }
    }

    pub fn total_discount(&self) -> Money {
        self.service_discount + self.referral_discount
    }
}
