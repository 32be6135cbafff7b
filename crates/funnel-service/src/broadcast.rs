//! Admin broadcasts
//!
//! One outbound message per recipient, sent through a bounded pool of
//! concurrent deliveries. The admin's status message is edited every
//! `progress_every` completions and once more with the final counts.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use funnel_core::{Language, User, UserId};
use tracing::{error, info, instrument, warn};

use crate::i18n;
use crate::services::ServiceContext;
use crate::transport::MessageRef;

/// Who receives a broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every active user
    Active,
    Single(UserId),
}

/// A broadcast requested by an admin. The template may use `{name}`,
/// `{service}` and `{expiry}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastJob {
    pub admin: UserId,
    pub template: String,
    pub audience: Audience,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
}

impl BroadcastReport {
    pub fn done(&self) -> usize {
        self.sent + self.failed
    }
}

/// Runs broadcast jobs
pub struct Broadcaster<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> Broadcaster<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self, job), fields(admin = %job.admin, audience = ?job.audience))]
    pub async fn run(&self, job: &BroadcastJob) -> BroadcastReport {
        let recipients = match self.recipients(job.audience).await {
            Ok(users) => users,
            Err(e) => {
                error!(error = %e, "Failed to load broadcast recipients");
                self.status(job.admin, None, &i18n::t(Language::En, "error_general"))
                    .await;
                return BroadcastReport::default();
            }
        };

        let settings = &self.ctx.config().broadcast;
        let mut report = BroadcastReport {
            total: recipients.len(),
            ..BroadcastReport::default()
        };

        let started = i18n::text(Language::En, "broadcast_started", &[("total", &report.total)]);
        let mut status = self.status(job.admin, None, &started).await;

        let now = self.ctx.now();
        let mut deliveries = stream::iter(recipients)
            .map(|user| self.deliver(&job.template, user, now))
            .buffer_unordered(settings.concurrency.max(1));

        while let Some(delivered) = deliveries.next().await {
            if delivered {
                report.sent += 1;
            } else {
                report.failed += 1;
            }

            let done = report.done();
            if done % settings.progress_every.max(1) == 0 && done < report.total {
                let progress = i18n::text(
                    Language::En,
                    "broadcast_progress",
                    &[
                        ("done", &done),
                        ("total", &report.total),
                        ("sent", &report.sent),
                        ("failed", &report.failed),
                    ],
                );
                status = self.status(job.admin, status, &progress).await;
            }
        }

        let summary = i18n::text(
            Language::En,
            "broadcast_done",
            &[
                ("sent", &report.sent),
                ("failed", &report.failed),
                ("total", &report.total),
            ],
        );
        self.status(job.admin, status, &summary).await;

        info!(sent = report.sent, failed = report.failed, "Broadcast finished");
        report
    }

    async fn recipients(&self, audience: Audience) -> Result<Vec<User>, funnel_core::DomainError> {
        match audience {
            Audience::Active => self.ctx.users().list(true, None).await,
            Audience::Single(id) => Ok(self.ctx.users().find_by_id(id).await?.into_iter().collect()),
        }
    }

    /// Render and send one message; `false` on any failure
    async fn deliver(&self, template: &str, user: User, now: DateTime<Utc>) -> bool {
        let subscription = match self.ctx.subscriptions().find_active(user.id, now).await {
            Ok(sub) => sub,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Subscription lookup failed, rendering without it");
                None
            }
        };

        let (service, expiry) = subscription.map_or_else(
            || ("N/A".to_string(), "N/A".to_string()),
            |sub| {
                (
                    self.ctx.config().catalog.name_of(sub.service),
                    sub.expiry_date
                        .map_or_else(|| "N/A".to_string(), |e| e.format("%Y-%m-%d").to_string()),
                )
            },
        );

        let text = i18n::fill(
            template,
            &[("name", &user.name), ("service", &service), ("expiry", &expiry)],
        );

        match self.ctx.transport().send_text(user.id, &text, None).await {
            Ok(_) => true,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Broadcast delivery failed");
                false
            }
        }
    }

    /// Edit the status message, or send a new one when there is none or
    /// the edit fails. Returns the message to edit next time.
    async fn status(
        &self,
        admin: UserId,
        message: Option<MessageRef>,
        text: &str,
    ) -> Option<MessageRef> {
        let transport = self.ctx.transport();
        if let Some(message) = message {
            match transport.edit_text(admin, message, text, None).await {
                Ok(()) => return Some(message),
                Err(e) => warn!(error = %e, "Failed to edit broadcast status"),
            }
        }
        match transport.send_text(admin, text, None).await {
            Ok(sent) => Some(sent),
            Err(e) => {
                warn!(error = %e, "Failed to send broadcast status");
                None
            }
        }
    }
}
