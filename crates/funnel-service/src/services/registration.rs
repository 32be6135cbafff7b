//! Registration wizard
//!
//! name → optional email → optional Telegram handle → privacy → phone →
//! country. The draft travels in the session; the user row is written only
//! when the last step validates.

use funnel_core::validation::{
    clean_country, clean_handle, validate_email, validate_name, validate_phone,
};
use funnel_core::{generate_referral_code, DomainError, Language, User};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::conversation::{
    ChoiceTag, Effect, Outcome, RegistrationDraft, SessionState, Turn,
};
use crate::dto::RegistrationForm;
use crate::i18n::{t, text};
use crate::keyboards;
use crate::mail::templates;
use crate::transport::{Button, Keyboard};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Fresh codes tried when a generated referral code collides
const MAX_CODE_ATTEMPTS: u32 = 5;

/// Registration service
pub struct RegistrationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RegistrationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// "Register" pressed
    #[instrument(skip(self, turn), fields(user_id = %turn.user_id))]
    pub async fn begin(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        if turn.user.is_some() {
            return Ok(Outcome::stay().answer(
                t(lang, "already_registered"),
                Some(keyboards::main_menu(lang)),
            ));
        }

        let (referral_code, language) = match turn.state {
            Some(SessionState::StartWithReferral {
                referral_code,
                language,
            }) => (referral_code, language),
            Some(ref other) => (
                other.draft().and_then(|d| d.referral_code.clone()),
                other.pending_language(),
            ),
            None => (None, None),
        };

        Ok(Outcome::put(SessionState::RegistrationName {
            referral_code,
            language,
        })
        .answer(t(lang, "registration_start"), Some(cancel_keyboard(lang))))
    }

    #[instrument(skip(self, turn), fields(user_id = %turn.user_id))]
    pub async fn cancel(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        Ok(Outcome::clear().answer(
            t(lang, "registration_cancelled"),
            Some(keyboards::welcome(lang)),
        ))
    }

    pub async fn submit_name(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(SessionState::RegistrationName {
            referral_code,
            language,
        }) = turn.state.clone()
        else {
            return Ok(restart(lang));
        };

        let Ok(name) = validate_name(turn.text()) else {
            return Ok(Outcome::stay().answer(t(lang, "error_invalid_name"), None));
        };

        let draft = RegistrationDraft {
            referral_code,
            language,
            name,
            ..RegistrationDraft::default()
        };
        Ok(Outcome::put(SessionState::RegistrationEmailOption { draft }).answer(
            t(lang, "ask_email_optional"),
            Some(yes_skip(lang, ChoiceTag::AddEmail(true), ChoiceTag::AddEmail(false))),
        ))
    }

    pub async fn email_option(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(SessionState::RegistrationEmailOption { mut draft }) = turn.state.clone() else {
            return Ok(restart(lang));
        };

        if matches!(turn.choice(), Some(ChoiceTag::AddEmail(true))) {
            return Ok(Outcome::put(SessionState::RegistrationEmail { draft })
                .answer(t(lang, "ask_email"), None));
        }

        draft.email = None;
        Ok(ask_telegram_option(lang, draft))
    }

    #[instrument(skip(self, turn), fields(user_id = %turn.user_id))]
    pub async fn submit_email(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(SessionState::RegistrationEmail { mut draft }) = turn.state.clone() else {
            return Ok(restart(lang));
        };

        let Ok(email) = validate_email(turn.text()) else {
            return Ok(Outcome::stay().answer(t(lang, "error_invalid_email"), None));
        };

        if self.ctx.users().find_by_email(&email).await?.is_some() {
            return Ok(Outcome::stay().answer(t(lang, "error_email_exists"), None));
        }

        draft.email = Some(email);
        Ok(ask_telegram_option(lang, draft))
    }

    pub async fn telegram_option(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(SessionState::RegistrationTelegramOption { mut draft }) = turn.state.clone()
        else {
            return Ok(restart(lang));
        };

        if matches!(turn.choice(), Some(ChoiceTag::AddTelegram(true))) {
            return Ok(Outcome::put(SessionState::RegistrationTelegram { draft })
                .answer(t(lang, "ask_telegram"), None));
        }

        // Skipping falls back to the handle the transport reports
        draft.telegram_username = turn.sender.username.as_deref().and_then(clean_handle);
        Ok(ask_privacy(lang, draft))
    }

    pub async fn submit_telegram(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(SessionState::RegistrationTelegram { mut draft }) = turn.state.clone() else {
            return Ok(restart(lang));
        };

        let Some(handle) = clean_handle(turn.text()) else {
            return Ok(Outcome::stay().answer(t(lang, "ask_telegram"), None));
        };

        draft.telegram_username = Some(handle);
        Ok(ask_privacy(lang, draft))
    }

    pub async fn privacy(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(SessionState::RegistrationPrivacy { mut draft }) = turn.state.clone() else {
            return Ok(restart(lang));
        };

        draft.privacy_allowed = matches!(turn.choice(), Some(ChoiceTag::Privacy(true)));
        Ok(Outcome::put(SessionState::RegistrationPhone { draft })
            .answer(t(lang, "ask_phone"), None))
    }

    pub async fn submit_phone(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(SessionState::RegistrationPhone { draft }) = turn.state.clone() else {
            return Ok(restart(lang));
        };

        let Ok(phone) = validate_phone(turn.text()) else {
            return Ok(Outcome::stay().answer(t(lang, "error_invalid_phone"), None));
        };

        Ok(Outcome::put(SessionState::RegistrationCountry { draft, phone })
            .answer(t(lang, "ask_country"), None))
    }

    /// Last step: validate, create the user, link the referrer
    #[instrument(skip(self, turn), fields(user_id = %turn.user_id))]
    pub async fn submit_country(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(SessionState::RegistrationCountry { draft, phone }) = turn.state.clone() else {
            return Ok(restart(lang));
        };

        let Ok(country) = clean_country(turn.text()) else {
            return Ok(Outcome::stay().answer(t(lang, "error_invalid_country"), None));
        };

        self.finish(&turn, draft, phone, country).await
    }

    /// New address after the first one was claimed by someone else
    #[instrument(skip(self, turn), fields(user_id = %turn.user_id))]
    pub async fn retry_email(&self, turn: Turn) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let Some(SessionState::RegistrationEmailRetry {
            mut draft,
            phone,
            country,
        }) = turn.state.clone()
        else {
            return Ok(restart(lang));
        };

        let Ok(email) = validate_email(turn.text()) else {
            return Ok(Outcome::stay().answer(t(lang, "error_invalid_email"), None));
        };
        if self.ctx.users().find_by_email(&email).await?.is_some() {
            return Ok(Outcome::stay().answer(t(lang, "error_email_exists"), None));
        }

        draft.email = Some(email);
        self.finish(&turn, draft, phone, country).await
    }

    async fn finish(
        &self,
        turn: &Turn,
        draft: RegistrationDraft,
        phone: String,
        country: String,
    ) -> ServiceResult<Outcome> {
        let lang = turn.language;
        let form = RegistrationForm::from_draft(&draft, &phone, &country);
        if let Err(e) = form.validate() {
            warn!(error = %e, "Registration draft failed final validation");
            return Ok(Outcome::clear().answer(
                t(lang, "registration_restart"),
                Some(keyboards::welcome(lang)),
            ));
        }

        let referrer = match draft.referral_code.as_deref() {
            Some(code) => self
                .ctx
                .users()
                .find_by_referral_code(code)
                .await?
                .filter(|r| r.id != turn.user_id),
            None => None,
        };

        let mut attempt = 0;
        let user = loop {
            let code = generate_referral_code(turn.user_id, turn.now, attempt);
            let new_user =
                form.clone()
                    .into_new_user(turn.user_id, code, referrer.as_ref().map(|r| r.id));

            match self.ctx.users().create(&new_user).await {
                Ok(user) => break user,
                Err(DomainError::ReferralCodeTaken) if attempt + 1 < MAX_CODE_ATTEMPTS => {
                    attempt += 1;
                }
                Err(DomainError::EmailAlreadyExists) => {
                    // Someone else claimed the address since the email step
                    let mut draft = draft;
                    draft.email = None;
                    return Ok(Outcome::put(SessionState::RegistrationEmailRetry {
                        draft,
                        phone,
                        country,
                    })
                    .answer(t(lang, "error_email_exists"), None));
                }
                Err(DomainError::UserAlreadyExists(_)) => {
                    return Ok(Outcome::clear().answer(
                        t(lang, "already_registered"),
                        Some(keyboards::main_menu(lang)),
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        };

        if let Some(referrer) = &referrer {
            match self.ctx.referrals().create(referrer.id, user.id).await {
                Ok(true) => info!(referrer_id = %referrer.id, "Referral recorded"),
                Ok(false) => {}
                Err(e) => warn!(referrer_id = %referrer.id, error = %e, "Failed to record referral"),
            }
        }

        info!(referral_code = %user.referral_code, attempts = attempt + 1, "User registered");
        Ok(self.completed(&user))
    }

    fn completed(&self, user: &User) -> Outcome {
        let lang = user.language;
        let config = self.ctx.config();
        let not_provided = t(lang, "not_provided");

        let email_status = user.email.clone().unwrap_or_else(|| not_provided.clone());
        let telegram_status = user
            .telegram_username
            .as_ref()
            .map_or(not_provided, |h| format!("@{h}"));
        let privacy_status = t(
            lang,
            if user.privacy_allowed {
                "privacy_allowed"
            } else {
                "privacy_denied"
            },
        );

        let summary = text(
            lang,
            "registration_complete",
            &[
                ("name", &user.name),
                ("email_status", &email_status),
                ("telegram_status", &telegram_status),
                ("privacy_status", &privacy_status),
                ("referral_link", &user.referral_link(&config.bot.username)),
            ],
        );
        let next = Keyboard::new()
            .button(t(lang, "btn_browse"), ChoiceTag::BrowseServices)
            .row(vec![
                Button::choice(t(lang, "btn_dashboard"), ChoiceTag::ShowDashboard),
                Button::choice(t(lang, "btn_referrals"), ChoiceTag::ShowReferrals),
            ]);

        let announcement = text(
            Language::En,
            "new_registration",
            &[
                ("name", &user.name),
                ("handle", &user.handle()),
                ("id", &user.id),
            ],
        );
        let notify_admins = config.admins.iter().map(|admin| Effect::Notify {
            to: admin,
            text: announcement.clone(),
            keyboard: None,
        });
        let welcome_mail = user
            .email
            .as_deref()
            .map(|email| Effect::Email(templates::welcome(email, &user.name)));

        Outcome::clear()
            .answer(summary, Some(next))
            .menu(t(lang, "menu_ready"), keyboards::user_menu_rows(lang))
            .effects(welcome_mail)
            .effects(notify_admins)
    }
}

fn restart(lang: Language) -> Outcome {
    Outcome::clear().answer(
        t(lang, "registration_restart"),
        Some(keyboards::welcome(lang)),
    )
}

fn cancel_keyboard(lang: Language) -> Keyboard {
    Keyboard::new().button(t(lang, "btn_cancel"), ChoiceTag::CancelRegistration)
}

fn yes_skip(lang: Language, yes: ChoiceTag, skip: ChoiceTag) -> Keyboard {
    Keyboard::new().row(vec![
        Button::choice(t(lang, "btn_yes"), yes),
        Button::choice(t(lang, "btn_skip"), skip),
    ])
}

fn ask_telegram_option(lang: Language, draft: RegistrationDraft) -> Outcome {
    Outcome::put(SessionState::RegistrationTelegramOption { draft }).answer(
        t(lang, "ask_telegram_optional"),
        Some(yes_skip(
            lang,
            ChoiceTag::AddTelegram(true),
            ChoiceTag::AddTelegram(false),
        )),
    )
}

fn ask_privacy(lang: Language, draft: RegistrationDraft) -> Outcome {
    Outcome::put(SessionState::RegistrationPrivacy { draft }).answer(
        t(lang, "ask_privacy"),
        Some(Keyboard::new().row(vec![
            Button::choice(t(lang, "btn_allow"), ChoiceTag::Privacy(true)),
            Button::choice(t(lang, "btn_deny"), ChoiceTag::Privacy(false)),
        ])),
    )
}
