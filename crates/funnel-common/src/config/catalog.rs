//! Service catalog
//!
//! The five offerings with their tier prices, an optional flat discount and
//! the chat group each purchased tier unlocks.

use funnel_core::{Money, PlanDuration, ServiceKey};

use super::app_config::ConfigError;

/// One sellable service with a price per duration tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOffer {
    pub key: ServiceKey,
    pub name: String,
    pub description: String,
    prices: [Money; 3],
    pub discount: Money,
    groups: [Option<i64>; 3],
}

impl ServiceOffer {
    fn new(key: ServiceKey, name: &str, description: &str, prices: [i64; 3]) -> Self {
        Self {
            key,
            name: name.to_string(),
            description: description.to_string(),
            prices: prices.map(Money::from_dollars),
            discount: Money::ZERO,
            groups: [None; 3],
        }
    }

    /// Listed price for a tier, before any discount
    #[must_use]
    pub fn price(&self, duration: PlanDuration) -> Money {
        self.prices[tier_index(duration)]
    }

    /// Chat group granted by a tier, if one is configured
    #[must_use]
    pub fn group(&self, duration: PlanDuration) -> Option<i64> {
        self.groups[tier_index(duration)]
    }
}

const fn tier_index(duration: PlanDuration) -> usize {
    match duration {
        PlanDuration::OneMonth => 0,
        PlanDuration::ThreeMonths => 1,
        PlanDuration::SixMonths => 2,
    }
}

/// Immutable catalog of every service on sale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCatalog {
    offers: Vec<ServiceOffer>,
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ServiceCatalog {
    /// Built-in offerings and prices in dollars
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            offers: vec![
                ServiceOffer::new(
                    ServiceKey::Mentorship,
                    "Mentorship",
                    "Group-based trading coaching",
                    [70, 180, 360],
                ),
                ServiceOffer::new(
                    ServiceKey::Masterclass,
                    "Master Class",
                    "Full course with structure",
                    [250, 600, 1200],
                ),
                ServiceOffer::new(
                    ServiceKey::FaceToFace,
                    "Face-to-Face Masterclass",
                    "1-on-1 in-person masterclass",
                    [500, 1200, 2400],
                ),
                ServiceOffer::new(
                    ServiceKey::VipSignals,
                    "VIP Signals",
                    "Daily signals to follow",
                    [10, 25, 45],
                ),
                ServiceOffer::new(
                    ServiceKey::OneToOne,
                    "One-to-One Coaching",
                    "Personal trading support and lessons",
                    [100, 250, 480],
                ),
            ],
        }
    }

    /// Apply `DISCOUNT_<SERVICE>` and `GROUP_<SERVICE>_<MONTHS>` overrides.
    ///
    /// A group id of `0` means "no group", matching an unset variable.
    pub(crate) fn with_overrides<F>(mut self, get: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for offer in &mut self.offers {
            let upper = offer.key.as_str().to_uppercase();

            let discount_key = format!("DISCOUNT_{upper}");
            if let Some(raw) = get(&discount_key) {
                let dollars: i64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(discount_key.clone(), raw.clone()))?;
                offer.discount = Money::from_dollars(dollars.max(0));
            }

            for duration in PlanDuration::ALL {
                let group_key = format!("GROUP_{upper}_{}", duration.months());
                if let Some(raw) = get(&group_key) {
                    let group: i64 = raw
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue(group_key.clone(), raw.clone()))?;
                    offer.groups[tier_index(duration)] = (group != 0).then_some(group);
                }
            }
        }
        Ok(self)
    }

    #[must_use]
    pub fn get(&self, key: ServiceKey) -> Option<&ServiceOffer> {
        self.offers.iter().find(|o| o.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceOffer> {
        self.offers.iter()
    }

    /// Display name, falling back to the key for unknown services
    #[must_use]
    pub fn name_of(&self, key: ServiceKey) -> String {
        self.get(key)
            .map_or_else(|| key.as_str().to_string(), |o| o.name.clone())
    }
}
