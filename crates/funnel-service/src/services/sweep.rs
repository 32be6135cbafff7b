//! Scheduled sweeps
//!
//! Each sweep is independent and returns the notifications it wants sent;
//! the caller runs them through the [`EffectRunner`](crate::effects::EffectRunner).

use chrono::{DateTime, Duration, Utc};
use funnel_core::SubscriptionWithUser;
use tracing::{info, instrument};

use crate::conversation::{ChoiceTag, Effect};
use crate::i18n::{t, text};
use crate::mail::templates;
use crate::transport::Keyboard;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Look-ahead for expiry warnings
pub const EXPIRY_WARNING_DAYS: i64 = 3;
/// How far back renewal reminders reach
pub const RENEWAL_WINDOW_DAYS: i64 = 7;

/// Rows touched by a sweep and the notifications it produced
#[derive(Debug, Default)]
pub struct SweepReport {
    pub processed: u64,
    pub effects: Vec<Effect>,
}

pub struct SweepService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SweepService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Warn users whose subscription ends within three days
    #[instrument(skip(self))]
    pub async fn expiring_soon(&self, now: DateTime<Utc>) -> ServiceResult<SweepReport> {
        let expiring = self
            .ctx
            .subscriptions()
            .find_expiring(now, now + Duration::days(EXPIRY_WARNING_DAYS))
            .await?;

        let mut effects = Vec::with_capacity(expiring.len() * 2);
        for row in &expiring {
            let service = self.ctx.config().catalog.name_of(row.subscription.service);
            let days_left = row.subscription.days_left(now);
            let lang = row.user_language;

            effects.push(Effect::Notify {
                to: row.subscription.user_id,
                text: text(
                    lang,
                    "expiry_warning",
                    &[("service", &service), ("days_left", &days_left)],
                ),
                keyboard: Some(renew_keyboard(row)),
            });
            if let Some(email) = row.user_email.as_deref() {
                effects.push(Effect::Email(templates::expiry_warning(
                    email,
                    &row.user_name,
                    &service,
                    days_left,
                )));
            }
        }

        info!(count = expiring.len(), "Expiry warnings prepared");
        Ok(SweepReport {
            processed: expiring.len() as u64,
            effects,
        })
    }

    /// Bulk `active -> expired` for everything past its expiry
    #[instrument(skip(self))]
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> ServiceResult<SweepReport> {
        let expired = self.ctx.subscriptions().expire_overdue(now).await?;
        info!(count = expired, "Subscriptions expired");
        Ok(SweepReport {
            processed: expired,
            effects: Vec::new(),
        })
    }

    /// Nudge users whose subscription ended in the past week
    #[instrument(skip(self))]
    pub async fn renewal_reminders(&self, now: DateTime<Utc>) -> ServiceResult<SweepReport> {
        let lapsed = self
            .ctx
            .subscriptions()
            .find_recently_expired(now - Duration::days(RENEWAL_WINDOW_DAYS), now)
            .await?;

        let mut effects = Vec::with_capacity(lapsed.len() * 2);
        for row in &lapsed {
            let service = self.ctx.config().catalog.name_of(row.subscription.service);
            effects.push(Effect::Notify {
                to: row.subscription.user_id,
                text: text(row.user_language, "renewal_reminder", &[("service", &service)]),
                keyboard: Some(renew_keyboard(row)),
            });
            if let Some(email) = row.user_email.as_deref() {
                effects.push(Effect::Email(templates::renewal_reminder(
                    email,
                    &row.user_name,
                    &service,
                )));
            }
        }

        info!(count = lapsed.len(), "Renewal reminders prepared");
        Ok(SweepReport {
            processed: lapsed.len() as u64,
            effects,
        })
    }

    /// Drop sessions idle for longer than the configured maximum age
    #[instrument(skip(self))]
    pub async fn purge_sessions(&self, now: DateTime<Utc>) -> ServiceResult<SweepReport> {
        let cutoff = now - self.ctx.config().session.max_age();
        let purged = self.ctx.sessions().purge_stale(cutoff).await?;
        info!(count = purged, "Stale sessions purged");
        Ok(SweepReport {
            processed: purged,
            effects: Vec::new(),
        })
    }

    /// Weekly numbers for every admin
    #[instrument(skip(self))]
    pub async fn weekly_stats(&self, now: DateTime<Utc>) -> ServiceResult<SweepReport> {
        let week_ago = now - Duration::days(7);
        let users = self.ctx.users().stats(week_ago).await?;
        let week = self.ctx.payments().revenue_stats(Some(week_ago)).await?;
        let total = self.ctx.payments().revenue_stats(None).await?;

        let report = text(
            funnel_core::Language::En,
            "weekly_stats",
            &[
                ("total_users", &users.total),
                ("new_users", &users.new_this_week),
                ("week_revenue", &week.total),
                ("week_count", &week.count),
                ("total_revenue", &total.total),
                ("average", &total.average),
            ],
        );
        let effects: Vec<_> = self
            .ctx
            .config()
            .admins
            .iter()
            .map(|admin| Effect::Notify {
                to: admin,
                text: report.clone(),
                keyboard: None,
            })
            .collect();

        Ok(SweepReport {
            processed: effects.len() as u64,
            effects,
        })
    }
}

fn renew_keyboard(row: &SubscriptionWithUser) -> Keyboard {
    Keyboard::new().button(
        t(row.user_language, "btn_renew"),
        ChoiceTag::SelectService(row.subscription.service),
    )
}
