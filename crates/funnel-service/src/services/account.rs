//! Entry points and the registered user's own account: main menu,
//! dashboard, referrals, profile edits and language.

use funnel_core::validation::{clean_country, validate_phone};
use funnel_core::{Language, User, UserField};
use tracing::{info, instrument};

use crate::conversation::{ChoiceTag, Command, Event, Outcome, SessionChange, SessionState, Turn};
use crate::i18n::{t, text};
use crate::keyboards;
use crate::transport::{Button, Keyboard};

use super::admin::AdminService;
use super::context::ServiceContext;
use super::error::ServiceResult;
use super::please_register;

const REFERRALS_PAGE: i64 = 10;

/// Account service
pub struct AccountService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AccountService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// `/start [ref_<code>]`
    ///
    /// Admins land on the admin panel, registered users on the main menu.
    /// Anyone else gets the welcome screen; a referral code is stashed in
    /// the session until registration completes.
    #[instrument(skip(self, turn), fields(user_id = %turn.user_id))]
    pub async fn start(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;

        if turn.is_admin(self.ctx) {
            let panel = AdminService::new(self.ctx).panel(turn).await?;
            return Ok(Outcome {
                session: SessionChange::Clear,
                ..panel
            }
            .menu(t(lang, "admin_menu_ready"), keyboards::admin_menu_rows()));
        }

        if turn.user.is_some() {
            return Ok(Outcome::clear()
                .answer(t(lang, "main_menu"), Some(keyboards::main_menu(lang)))
                .menu(t(lang, "menu_ready"), keyboards::user_menu_rows(lang)));
        }

        let referral_code = match &turn.event {
            Event::Command(Command::Start { referral_code }) => referral_code.clone(),
            _ => None,
        };
        if let Some(code) = &referral_code {
            info!(referral_code = %code, "Referred visitor");
        }

        Ok(Outcome::put(SessionState::StartWithReferral {
            referral_code,
            language: turn.state.as_ref().and_then(SessionState::pending_language),
        })
        .answer(t(lang, "welcome"), Some(keyboards::welcome(lang))))
    }

    /// `/cancel`: leave whatever flow is in progress
    pub async fn cancel(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let keyboard = if turn.user.is_some() {
            keyboards::main_menu(lang)
        } else {
            keyboards::welcome(lang)
        };
        Ok(Outcome::clear().answer(t(lang, "cancelled"), Some(keyboard)))
    }

    pub async fn main_menu(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        if turn.user.is_none() {
            return Ok(Outcome::stay().answer(t(lang, "welcome"), Some(keyboards::welcome(lang))));
        }
        Ok(Outcome::clear().answer(t(lang, "main_menu"), Some(keyboards::main_menu(lang))))
    }

    pub async fn help_menu(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let keyboard = Keyboard::new()
            .button(t(lang, "btn_support"), ChoiceTag::ContactSupport)
            .button(t(lang, "btn_main_menu"), ChoiceTag::MainMenu);
        Ok(Outcome::stay().answer(t(lang, "help_menu"), Some(keyboard)))
    }

    pub async fn contact_support(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let url = self.ctx.support_url();
        let keyboard = Keyboard::new()
            .link(t(lang, "btn_support"), url.clone())
            .button(t(lang, "btn_main_menu"), ChoiceTag::MainMenu);
        Ok(Outcome::stay().answer(
            text(lang, "contact_support", &[("support", &url)]),
            Some(keyboard),
        ))
    }

    pub async fn dashboard(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(user) = turn.user.as_ref() else {
            return Ok(please_register(lang));
        };

        let subscription = self.ctx.subscriptions().find_active(user.id, turn.now).await?;
        let referral_count = self.ctx.referrals().count_for_referrer(user.id).await?;

        let subscription_text = subscription.as_ref().map_or_else(
            || t(lang, "no_subscription"),
            |sub| {
                text(
                    lang,
                    "subscription_info",
                    &[
                        ("service", &self.ctx.config().catalog.name_of(sub.service)),
                        (
                            "expiry_date",
                            &sub.expiry_date
                                .map_or_else(|| "N/A".to_string(), |e| e.format("%Y-%m-%d").to_string()),
                        ),
                        ("days_left", &sub.days_left(turn.now)),
                        ("amount", &sub.amount),
                    ],
                )
            },
        );

        let not_set = "N/A".to_string();
        let body = text(
            lang,
            "dashboard",
            &[
                ("name", &user.name),
                ("email", user.email.as_ref().unwrap_or(&not_set)),
                ("phone", user.phone.as_ref().unwrap_or(&not_set)),
                ("country", user.country.as_ref().unwrap_or(&not_set)),
                ("telegram", &user.handle()),
                ("subscription", &subscription_text),
                ("referral_count", &referral_count),
                ("referral_link", &self.referral_link(user)),
            ],
        );

        let buy_label = if subscription.is_some() {
            "btn_renew"
        } else {
            "btn_subscribe"
        };
        let keyboard = Keyboard::new()
            .row(vec![
                Button::choice(t(lang, buy_label), ChoiceTag::BrowseServices),
                Button::choice(t(lang, "btn_referrals"), ChoiceTag::ShowReferrals),
            ])
            .button(t(lang, "btn_update_profile"), ChoiceTag::UpdateProfile)
            .button(t(lang, "btn_main_menu"), ChoiceTag::MainMenu);

        Ok(Outcome::stay().answer(body, Some(keyboard)))
    }

    pub async fn referrals(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(user) = turn.user.as_ref() else {
            return Ok(please_register(lang));
        };

        let count = self.ctx.referrals().count_for_referrer(user.id).await?;
        let recent = self
            .ctx
            .referrals()
            .list_for_referrer(user.id, REFERRALS_PAGE)
            .await?;
        let link = self.referral_link(user);

        let mut body = text(
            lang,
            "referrals_header",
            &[("count", &count), ("referral_link", &link)],
        );
        body.push_str("\n\n");
        if recent.is_empty() {
            body.push_str(&t(lang, "referrals_empty"));
        } else {
            for summary in &recent {
                body.push_str(&format!(
                    "• {} ({}) {}\n",
                    summary.referred_name,
                    summary.referral.status.as_str(),
                    summary.referral.created_at.format("%Y-%m-%d"),
                ));
            }
        }

        let keyboard = Keyboard::new()
            .row(vec![
                Button::choice(t(lang, "btn_copy_link"), ChoiceTag::CopyReferralLink),
                Button::url(
                    t(lang, "btn_share_link"),
                    format!("https://t.me/share/url?url={link}"),
                ),
            ])
            .button(t(lang, "btn_main_menu"), ChoiceTag::MainMenu);

        Ok(Outcome::stay().answer(body.trim_end().to_string(), Some(keyboard)))
    }

    /// Link as a separate message so it can be forwarded on its own
    pub async fn copy_referral_link(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(user) = turn.user.as_ref() else {
            return Ok(please_register(lang));
        };
        Ok(Outcome::stay().send(
            text(lang, "referral_link", &[("link", &self.referral_link(user))]),
            None,
        ))
    }

    pub async fn update_profile(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        if turn.user.is_none() {
            return Ok(please_register(lang));
        }
        let keyboard = Keyboard::new()
            .row(vec![
                Button::choice(t(lang, "btn_update_phone"), ChoiceTag::UpdatePhone),
                Button::choice(t(lang, "btn_update_country"), ChoiceTag::UpdateCountry),
            ])
            .button(t(lang, "btn_back"), ChoiceTag::ShowDashboard);
        Ok(Outcome::stay().answer(t(lang, "update_profile"), Some(keyboard)))
    }

    pub async fn update_phone(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        if turn.user.is_none() {
            return Ok(please_register(lang));
        }
        Ok(Outcome::put(SessionState::UpdatingPhone {})
            .answer(t(lang, "ask_new_phone"), Some(back_to_dashboard(lang))))
    }

    pub async fn update_country(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        if turn.user.is_none() {
            return Ok(please_register(lang));
        }
        Ok(Outcome::put(SessionState::UpdatingCountry {})
            .answer(t(lang, "ask_new_country"), Some(back_to_dashboard(lang))))
    }

    #[instrument(skip(self, turn), fields(user_id = %turn.user_id))]
    pub async fn save_phone(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Ok(phone) = validate_phone(turn.text()) else {
            return Ok(Outcome::stay().answer(t(lang, "error_invalid_phone"), None));
        };
        self.save_field(&turn, UserField::Phone(phone)).await
    }

    #[instrument(skip(self, turn), fields(user_id = %turn.user_id))]
    pub async fn save_country(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Ok(country) = clean_country(turn.text()) else {
            return Ok(Outcome::stay().answer(t(lang, "error_invalid_country"), None));
        };
        self.save_field(&turn, UserField::Country(country)).await
    }

    async fn save_field(&self, turn: &Turn, field: UserField) -> ServiceResult<Outcome> {
        let lang = turn.language;
        if turn.user.is_none() {
            return Ok(Outcome::clear().answer(t(lang, "please_register"), Some(keyboards::welcome(lang))));
        }
        self.ctx.users().update_field(turn.user_id, &field).await?;
        info!(field = field.column(), "Profile updated");
        Ok(Outcome::clear().answer(t(lang, "profile_updated"), Some(back_to_dashboard(lang))))
    }

    pub async fn change_language(&self, turn: Turn) -> ServiceResult<Outcome> {
        Ok(Outcome::stay().answer(
            t(turn.language, "choose_language"),
            Some(keyboards::language_picker(ChoiceTag::MainMenu)),
        ))
    }

    /// Registered users get the column updated and a relabelled menu;
    /// visitors keep the choice in the session until they register.
    #[instrument(skip(self, turn), fields(user_id = %turn.user_id))]
    pub async fn set_language(&self, turn: Turn) -> ServiceResult<Outcome> {
        let Some(ChoiceTag::SetLanguage(lang)) = turn.choice() else {
            return Ok(Outcome::stay().answer(t(turn.language, "unknown_action"), None));
        };
        let lang: Language = *lang;

        if turn.user.is_some() {
            self.ctx
                .users()
                .update_field(turn.user_id, &UserField::Language(lang))
                .await?;
            info!(language = %lang, "Language changed");
            return Ok(Outcome::stay()
                .answer(t(lang, "language_updated"), Some(keyboards::main_menu(lang)))
                .menu(t(lang, "menu_ready"), keyboards::user_menu_rows(lang)));
        }

        let referral_code = match &turn.state {
            Some(SessionState::StartWithReferral { referral_code, .. }
                | SessionState::RegistrationName { referral_code, .. }) => referral_code.clone(),
            Some(other) => other.draft().and_then(|d| d.referral_code.clone()),
            None => None,
        };
        Ok(Outcome::put(SessionState::StartWithReferral {
            referral_code,
            language: Some(lang),
        })
        .answer(t(lang, "welcome"), Some(keyboards::welcome(lang))))
    }

    fn referral_link(&self, user: &User) -> String {
        user.referral_link(&self.ctx.config().bot.username)
    }
}

fn back_to_dashboard(lang: Language) -> Keyboard {
    Keyboard::new().button(t(lang, "btn_dashboard_short"), ChoiceTag::ShowDashboard)
}
