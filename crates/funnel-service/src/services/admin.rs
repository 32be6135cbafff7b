//! Admin actions
//!
//! Every action re-checks the admin allow-list; a button forwarded to or
//! replayed by a non-admin gets `PermissionDenied`.

use chrono::Duration;
use funnel_core::{
    Approval, DomainError, Language, Payment, PaymentId, PaymentStatus, User, UserId,
};
use tracing::{info, instrument, warn};

use crate::broadcast::{Audience, BroadcastJob};
use crate::conversation::{ChoiceTag, Effect, Outcome, SessionState, Turn};
use crate::i18n::{t, text};
use crate::mail::templates;
use crate::transport::{Button, Keyboard};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

const PENDING_PAGE: i64 = 10;
const USERS_PAGE: i64 = 20;

/// Admin service
pub struct AdminService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AdminService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    fn require_admin(&self, turn: &Turn, action: &str) -> ServiceResult<()> {
        if turn.is_admin(self.ctx) {
            Ok(())
        } else {
            warn!(user_id = %turn.user_id, action, "Admin action refused");
            Err(ServiceError::permission_denied(action))
        }
    }

    /// Stats overview. Leaves any broadcast dialog.
    #[instrument(skip(self, turn), fields(user_id = %turn.user_id))]
    pub async fn panel(&self, turn: Turn) -> ServiceResult<Outcome> {
        self.require_admin(&turn, "admin_panel")?;
        let lang = turn.language;

        let users = self.ctx.users().stats(turn.now - Duration::days(7)).await?;
        let revenue = self.ctx.payments().revenue_stats(None).await?;
        let pending = self.ctx.payments().count_pending().await?;

        let summary = text(
            lang,
            "admin_panel",
            &[
                ("total_users", &users.total),
                ("new_users", &users.new_this_week),
                ("active_users", &users.active),
                ("revenue", &revenue.total),
                ("payment_count", &revenue.count),
                ("average", &revenue.average),
                ("pending", &pending),
            ],
        );
        let keyboard = Keyboard::new()
            .button(
                text(lang, "btn_admin_pending", &[("count", &pending)]),
                ChoiceTag::AdminPendingPayments,
            )
            .row(vec![
                Button::choice(t(lang, "btn_admin_users"), ChoiceTag::AdminAllUsers),
                Button::choice(t(lang, "btn_admin_service_stats"), ChoiceTag::AdminServiceStats),
            ])
            .row(vec![
                Button::choice(t(lang, "btn_admin_broadcast"), ChoiceTag::AdminBroadcast),
                Button::choice(t(lang, "btn_admin_broadcast_user"), ChoiceTag::AdminBroadcastUser),
            ])
            .button(t(lang, "btn_main_menu"), ChoiceTag::MainMenu);

        let in_admin_dialog = turn.step().is_some_and(|s| s.is_admin());
        let outcome = if in_admin_dialog {
            Outcome::clear()
        } else {
            Outcome::stay()
        };
        Ok(outcome.answer(summary, Some(keyboard)))
    }

    pub async fn pending_payments(&self, turn: Turn) -> ServiceResult<Outcome> {
        self.require_admin(&turn, "pending_payments")?;
        let lang = turn.language;

        let pending = self.ctx.payments().list_pending(PENDING_PAGE).await?;
        if pending.is_empty() {
            return Ok(Outcome::stay().answer(t(lang, "pending_empty"), Some(back_to_panel(lang))));
        }

        let count = self.ctx.payments().count_pending().await?;
        let mut outcome = Outcome::stay().answer(
            text(lang, "pending_header", &[("count", &count)]),
            Some(back_to_panel(lang)),
        );
        for item in pending {
            let id = item.payment.id;
            let body = text(
                lang,
                "pending_item",
                &[
                    ("id", &id),
                    ("user_name", &item.user_name),
                    ("service", &self.ctx.config().catalog.name_of(item.service)),
                    ("duration", &item.duration),
                    ("amount", &item.payment.amount),
                    ("method", &item.payment.payment_method.display_name()),
                    ("date", &item.payment.created_at.format("%Y-%m-%d %H:%M")),
                ],
            );
            outcome = outcome.send(body, Some(decision_keyboard(lang, id)));
        }
        Ok(outcome)
    }

    /// The payment under review and its owner, read before anything is
    /// written so the decision is the last storage call of the turn
    async fn review_target(&self, id: PaymentId) -> ServiceResult<(Payment, Option<User>)> {
        let payment = self
            .ctx
            .payments()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Payment", id))?;
        let user = self.ctx.users().find_by_id(payment.user_id).await?;
        Ok((payment, user))
    }

    /// Approve a payment and activate its subscription
    #[instrument(skip(self, turn), fields(admin_id = %turn.user_id))]
    pub async fn approve(&self, turn: Turn) -> ServiceResult<Outcome> {
        self.require_admin(&turn, "approve_payment")?;
        let lang = turn.language;
        let Some(ChoiceTag::ApprovePayment(id)) = turn.choice() else {
            return Err(ServiceError::validation("approve without a payment id"));
        };
        let id = *id;

        let (payment, user) = self.review_target(id).await?;
        if payment.status.is_terminal() {
            return Ok(already_processed(lang, id, payment.status));
        }

        let Approval {
            payment,
            subscription,
        } = match self.ctx.payments().approve(id, turn.user_id, turn.now).await {
            Ok(approval) => approval,
            Err(DomainError::PaymentAlreadyProcessed { id, status }) => {
                return Ok(already_processed(lang, id, status));
            }
            Err(DomainError::PaymentNotFound(_)) => {
                return Err(ServiceError::not_found("Payment", id));
            }
            Err(e) => return Err(e.into()),
        };
        let expiry = subscription.expiry_date.unwrap_or(turn.now);

        info!(
            payment_id = %id,
            subscription_id = %subscription.id,
            expiry = %expiry,
            "Payment approved"
        );

        let expiry_date = expiry.format("%Y-%m-%d").to_string();
        let mut effects = Vec::new();
        if let Some(user) = user {
            let service = self.ctx.config().catalog.name_of(subscription.service);
            let ulang = user.language;
            effects.push(Effect::Notify {
                to: user.id,
                text: text(
                    ulang,
                    "bot_payment_approved",
                    &[
                        ("service", &service),
                        ("duration", &subscription.duration),
                        ("amount", &payment.amount),
                        ("expiry_date", &expiry_date),
                    ],
                ),
                keyboard: Some(
                    Keyboard::new().button(t(ulang, "btn_dashboard"), ChoiceTag::ShowDashboard),
                ),
            });
            if let Some(email) = user.email.as_deref() {
                effects.push(Effect::Email(templates::payment_confirmation(
                    email,
                    &user.name,
                    &service,
                    subscription.duration,
                    payment.amount,
                )));
            }
            let group = self
                .ctx
                .config()
                .catalog
                .get(subscription.service)
                .and_then(|offer| offer.group(subscription.duration));
            if let Some(group) = group {
                effects.push(Effect::GroupInvite {
                    user_id: user.id,
                    group,
                    language: ulang,
                });
            }
        } else {
            warn!(user_id = %payment.user_id, "Approved payment has no user row");
        }

        Ok(Outcome::stay()
            .answer(
                text(
                    lang,
                    "payment_approved_admin",
                    &[("id", &id), ("expiry_date", &expiry_date)],
                ),
                Some(back_to_panel(lang)),
            )
            .effects(effects))
    }

    #[instrument(skip(self, turn), fields(admin_id = %turn.user_id))]
    pub async fn reject(&self, turn: Turn) -> ServiceResult<Outcome> {
        self.require_admin(&turn, "reject_payment")?;
        let lang = turn.language;
        let Some(ChoiceTag::RejectPayment(id)) = turn.choice() else {
            return Err(ServiceError::validation("reject without a payment id"));
        };
        let id = *id;

        let (payment, user) = self.review_target(id).await?;
        if payment.status.is_terminal() {
            return Ok(already_processed(lang, id, payment.status));
        }
        let service = match user.as_ref().and_then(|u| u.email.as_ref()) {
            Some(_) => self
                .ctx
                .subscriptions()
                .find_by_id(payment.subscription_id)
                .await?
                .map_or_else(String::new, |s| self.ctx.config().catalog.name_of(s.service)),
            None => String::new(),
        };

        let payment = match self.ctx.payments().reject(id, turn.user_id, turn.now).await {
            Ok(payment) => payment,
            Err(DomainError::PaymentAlreadyProcessed { id, status }) => {
                return Ok(already_processed(lang, id, status));
            }
            Err(DomainError::PaymentNotFound(_)) => {
                return Err(ServiceError::not_found("Payment", id));
            }
            Err(e) => return Err(e.into()),
        };
        info!(payment_id = %id, "Payment rejected");

        let effects = self.rejection_effects(&payment, user.as_ref(), &service);
        Ok(Outcome::stay()
            .answer(
                text(lang, "payment_rejected_admin", &[("id", &id)]),
                Some(back_to_panel(lang)),
            )
            .effects(effects))
    }

    fn rejection_effects(
        &self,
        payment: &Payment,
        user: Option<&User>,
        service: &str,
    ) -> Vec<Effect> {
        let Some(user) = user else {
            warn!(user_id = %payment.user_id, "Rejected payment has no user row");
            return Vec::new();
        };
        let ulang = user.language;

        let mut effects = vec![Effect::Notify {
            to: user.id,
            text: text(
                ulang,
                "bot_payment_rejected",
                &[
                    ("amount", &payment.amount),
                    ("payment_method", &payment.payment_method.display_name()),
                ],
            ),
            keyboard: Some(
                Keyboard::new()
                    .button(t(ulang, "btn_try_again"), ChoiceTag::BrowseServices)
                    .link(t(ulang, "btn_support"), self.ctx.support_url()),
            ),
        }];

        if let Some(email) = user.email.as_deref() {
            effects.push(Effect::Email(templates::payment_rejected(
                email,
                &user.name,
                service,
                payment.amount,
            )));
        }
        effects
    }

    pub async fn all_users(&self, turn: Turn) -> ServiceResult<Outcome> {
        self.require_admin(&turn, "all_users")?;
        let lang = turn.language;

        let stats = self.ctx.users().stats(turn.now - Duration::days(7)).await?;
        let users = self.ctx.users().list(false, Some(USERS_PAGE)).await?;

        let mut body = text(lang, "users_header", &[("count", &stats.total)]);
        for user in &users {
            let subscribed = self
                .ctx
                .subscriptions()
                .find_active(user.id, turn.now)
                .await?
                .is_some();
            let mark = if subscribed { "✅" } else { "❌" };
            body.push('\n');
            body.push_str(&text(
                lang,
                "user_line",
                &[
                    ("mark", &mark),
                    ("name", &user.name),
                    ("handle", &user.handle()),
                    ("id", &user.id),
                ],
            ));
        }

        Ok(Outcome::stay().answer(body, Some(back_to_panel(lang))))
    }

    pub async fn service_stats(&self, turn: Turn) -> ServiceResult<Outcome> {
        self.require_admin(&turn, "service_stats")?;
        let lang = turn.language;

        let stats = self.ctx.subscriptions().service_stats(turn.now).await?;
        let mut body = t(lang, "service_stats_header");
        for row in stats {
            body.push('\n');
            body.push_str(&text(
                lang,
                "service_stats_line",
                &[
                    ("service", &self.ctx.config().catalog.name_of(row.service)),
                    ("active", &row.active_subscriptions),
                    ("revenue", &row.revenue),
                ],
            ));
        }

        Ok(Outcome::stay().answer(body, Some(back_to_panel(lang))))
    }

    pub async fn broadcast_prompt(&self, turn: Turn) -> ServiceResult<Outcome> {
        self.require_admin(&turn, "broadcast")?;
        let lang = turn.language;
        Ok(Outcome::put(SessionState::AdminBroadcast {})
            .answer(t(lang, "broadcast_prompt"), Some(back_to_panel(lang))))
    }

    pub async fn broadcast_user_list(&self, turn: Turn) -> ServiceResult<Outcome> {
        self.require_admin(&turn, "broadcast_user")?;
        let lang = turn.language;

        let users = self.ctx.users().list(true, Some(USERS_PAGE)).await?;
        let keyboard = users
            .iter()
            .fold(Keyboard::new(), |kb, user| {
                kb.button(
                    format!("{} ({})", user.name, user.handle()),
                    ChoiceTag::AdminBroadcastUserSelect(user.id),
                )
            })
            .button(t(lang, "btn_back"), ChoiceTag::AdminPanel);

        Ok(Outcome::stay().answer(t(lang, "broadcast_user_pick"), Some(keyboard)))
    }

    pub async fn broadcast_user_select(&self, turn: Turn) -> ServiceResult<Outcome> {
        self.require_admin(&turn, "broadcast_user")?;
        let lang = turn.language;
        let Some(ChoiceTag::AdminBroadcastUserSelect(target)) = turn.choice() else {
            return Err(ServiceError::validation("broadcast target missing"));
        };
        let target: UserId = *target;

        let user = self
            .ctx
            .users()
            .find_by_id(target)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", target))?;

        Ok(Outcome::put(SessionState::AdminBroadcastUser { target }).answer(
            text(lang, "broadcast_user_prompt", &[("name", &user.name)]),
            Some(back_to_panel(lang)),
        ))
    }

    /// Broadcast text received: hand it to the broadcaster
    #[instrument(skip(self, turn), fields(admin_id = %turn.user_id))]
    pub async fn broadcast_message(&self, turn: Turn) -> ServiceResult<Outcome> {
        self.require_admin(&turn, "broadcast")?;
        self.start_broadcast(&turn, Audience::Active)
    }

    #[instrument(skip(self, turn), fields(admin_id = %turn.user_id))]
    pub async fn broadcast_to_user(&self, turn: Turn) -> ServiceResult<Outcome> {
        self.require_admin(&turn, "broadcast_user")?;
        let Some(SessionState::AdminBroadcastUser { target }) = turn.state else {
            return Err(ServiceError::validation("broadcast target missing"));
        };
        self.start_broadcast(&turn, Audience::Single(target))
    }

    fn start_broadcast(&self, turn: &Turn, audience: Audience) -> ServiceResult<Outcome> {
        let template = turn.text();
        if template.is_empty() {
            return Ok(Outcome::stay().answer(t(turn.language, "broadcast_prompt"), None));
        }

        info!(audience = ?audience, "Broadcast requested");
        Ok(Outcome::clear().effect(Effect::Broadcast(BroadcastJob {
            admin: turn.user_id,
            template: template.to_string(),
            audience,
        })))
    }
}

fn already_processed(lang: Language, id: PaymentId, status: PaymentStatus) -> Outcome {
    Outcome::stay().answer(
        text(
            lang,
            "payment_already_processed",
            &[("id", &id), ("status", &status)],
        ),
        Some(back_to_panel(lang)),
    )
}

fn back_to_panel(lang: Language) -> Keyboard {
    Keyboard::new().button(t(lang, "btn_admin_panel"), ChoiceTag::AdminPanel)
}

fn decision_keyboard(lang: Language, id: PaymentId) -> Keyboard {
    Keyboard::new().row(vec![
        Button::choice(
            text(lang, "btn_approve", &[("id", &id)]),
            ChoiceTag::ApprovePayment(id),
        ),
        Button::choice(
            text(lang, "btn_reject", &[("id", &id)]),
            ChoiceTag::RejectPayment(id),
        ),
    ])
}
