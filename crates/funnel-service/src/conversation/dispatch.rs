//! Dispatch table
//!
//! Maps (scope, event kind) to a transition function. Built once at startup.
//! Resolution tries the entry for the user's current step first, then the
//! step-independent entry; anything left over gets [`fallback`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use funnel_core::{Language, User, UserId};

use super::choice::{ChoiceKind, ChoiceTag};
use super::event::{CommandKind, Event, SenderProfile};
use super::outcome::Outcome;
use super::state::{SessionState, StepKind};
use crate::i18n::t;
use crate::keyboards;
use crate::services::{
    AccountService, AdminService, PurchaseService, RegistrationService, ServiceContext,
    ServiceResult,
};

/// Everything a transition gets to look at
#[derive(Debug, Clone)]
pub struct Turn {
    pub user_id: UserId,
    pub sender: SenderProfile,
    /// Registered user record, if any
    pub user: Option<User>,
    pub language: Language,
    pub state: Option<SessionState>,
    pub event: Event,
    pub now: DateTime<Utc>,
}

impl Turn {
    pub fn step(&self) -> Option<StepKind> {
        self.state.as_ref().map(SessionState::kind)
    }

    /// Trimmed text of a text event, empty for anything else
    pub fn text(&self) -> &str {
        match &self.event {
            Event::Text(text) => text.trim(),
            _ => "",
        }
    }

    pub fn choice(&self) -> Option<&ChoiceTag> {
        match &self.event {
            Event::Choice(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_admin(&self, ctx: &ServiceContext) -> bool {
        ctx.is_admin(self.user_id)
    }
}

pub type Transition = for<'a> fn(&'a ServiceContext, Turn) -> BoxFuture<'a, ServiceResult<Outcome>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Any,
    Step(StepKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKey {
    Command(CommandKind),
    Choice(ChoiceKind),
    UnknownChoice,
    Text,
    File,
}

impl EventKey {
    pub fn of(event: &Event) -> Self {
        match event {
            Event::Command(cmd) => Self::Command(cmd.kind()),
            Event::Choice(tag) => Self::Choice(tag.kind()),
            Event::UnknownChoice(_) => Self::UnknownChoice,
            Event::Text(_) => Self::Text,
            Event::File(_) => Self::File,
        }
    }
}

macro_rules! route {
    ($service:ident :: $method:ident) => {{
        fn transition(ctx: &ServiceContext, turn: Turn) -> BoxFuture<'_, ServiceResult<Outcome>> {
            Box::pin(async move { $service::new(ctx).$method(turn).await })
        }
        transition as Transition
    }};
}

pub struct DispatchTable {
    routes: HashMap<(Scope, EventKey), Transition>,
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("routes", &self.routes.len())
            .finish()
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl DispatchTable {
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Register a transition; a later entry for the same key replaces the earlier one
    pub fn on(mut self, scope: Scope, key: EventKey, transition: Transition) -> Self {
        self.routes.insert((scope, key), transition);
        self
    }

    fn any(self, key: EventKey, transition: Transition) -> Self {
        self.on(Scope::Any, key, transition)
    }

    fn step(self, step: StepKind, key: EventKey, transition: Transition) -> Self {
        self.on(Scope::Step(step), key, transition)
    }

    pub fn resolve(&self, step: Option<StepKind>, key: EventKey) -> Option<Transition> {
        step.and_then(|s| self.routes.get(&(Scope::Step(s), key)))
            .or_else(|| self.routes.get(&(Scope::Any, key)))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Every flow of the bot
    #[allow(clippy::too_many_lines)]
    pub fn standard() -> Self {
        use ChoiceKind as C;
        use EventKey::{Choice, Command, File, Text};
        use StepKind as S;

        Self::empty()
            // Commands
            .any(Command(CommandKind::Start), route!(AccountService::start))
            .any(Command(CommandKind::Cancel), route!(AccountService::cancel))
            .any(Command(CommandKind::Help), route!(AccountService::help_menu))
            // Registration
            .any(Choice(C::RegisterStart), route!(RegistrationService::begin))
            .any(Choice(C::CancelRegistration), route!(RegistrationService::cancel))
            .step(S::RegistrationName, Text, route!(RegistrationService::submit_name))
            .step(
                S::RegistrationEmailOption,
                Choice(C::AddEmail),
                route!(RegistrationService::email_option),
            )
            .step(S::RegistrationEmail, Text, route!(RegistrationService::submit_email))
            .step(
                S::RegistrationTelegramOption,
                Choice(C::AddTelegram),
                route!(RegistrationService::telegram_option),
            )
            .step(
                S::RegistrationTelegram,
                Text,
                route!(RegistrationService::submit_telegram),
            )
            .step(
                S::RegistrationPrivacy,
                Choice(C::Privacy),
                route!(RegistrationService::privacy),
            )
            .step(S::RegistrationPhone, Text, route!(RegistrationService::submit_phone))
            .step(
                S::RegistrationCountry,
                Text,
                route!(RegistrationService::submit_country),
            )
            .step(
                S::RegistrationEmailRetry,
                Text,
                route!(RegistrationService::retry_email),
            )
            // Purchase
            .any(Choice(C::BrowseServices), route!(PurchaseService::browse))
            .any(Choice(C::SelectService), route!(PurchaseService::select_service))
            .step(
                S::SelectingDuration,
                Choice(C::Duration),
                route!(PurchaseService::select_duration),
            )
            .step(
                S::SelectingPayment,
                Choice(C::Payment),
                route!(PurchaseService::select_payment),
            )
            .step(
                S::WaitingBinanceMethod,
                Choice(C::Binance),
                route!(PurchaseService::binance_route),
            )
            .step(
                S::EnteringOrderId,
                Choice(C::SubmitOrderId),
                route!(PurchaseService::prompt_order_id),
            )
            .step(S::EnteringOrderId, Text, route!(PurchaseService::submit_order_id))
            .step(
                S::EnteringTxHash,
                Choice(C::SubmitTxHash),
                route!(PurchaseService::prompt_tx_hash),
            )
            .step(S::EnteringTxHash, Text, route!(PurchaseService::submit_tx_hash))
            .step(
                S::WaitingReceipt,
                Choice(C::UploadReceipt),
                route!(PurchaseService::request_upload),
            )
            .step(
                S::UploadingReceipt,
                Choice(C::UploadReceipt),
                route!(PurchaseService::request_upload),
            )
            .step(S::WaitingReceipt, File, route!(PurchaseService::receive_receipt))
            .step(S::UploadingReceipt, File, route!(PurchaseService::receive_receipt))
            .any(Choice(C::CancelPayment), route!(PurchaseService::cancel_payment))
            // Admin
            .any(Choice(C::AdminPanel), route!(AdminService::panel))
            .any(
                Choice(C::AdminPendingPayments),
                route!(AdminService::pending_payments),
            )
            .any(Choice(C::ApprovePayment), route!(AdminService::approve))
            .any(Choice(C::RejectPayment), route!(AdminService::reject))
            .any(Choice(C::AdminAllUsers), route!(AdminService::all_users))
            .any(Choice(C::AdminServiceStats), route!(AdminService::service_stats))
            .any(Choice(C::AdminBroadcast), route!(AdminService::broadcast_prompt))
            .any(
                Choice(C::AdminBroadcastUser),
                route!(AdminService::broadcast_user_list),
            )
            .any(
                Choice(C::AdminBroadcastUserSelect),
                route!(AdminService::broadcast_user_select),
            )
            .step(S::AdminBroadcast, Text, route!(AdminService::broadcast_message))
            .step(
                S::AdminBroadcastUser,
                Text,
                route!(AdminService::broadcast_to_user),
            )
            // Account
            .any(Choice(C::MainMenu), route!(AccountService::main_menu))
            .any(Choice(C::HelpMenu), route!(AccountService::help_menu))
            .any(Choice(C::ContactSupport), route!(AccountService::contact_support))
            .any(Choice(C::ShowDashboard), route!(AccountService::dashboard))
            .any(Choice(C::ShowReferrals), route!(AccountService::referrals))
            .any(
                Choice(C::CopyReferralLink),
                route!(AccountService::copy_referral_link),
            )
            .any(Choice(C::UpdateProfile), route!(AccountService::update_profile))
            .any(Choice(C::UpdatePhone), route!(AccountService::update_phone))
            .any(Choice(C::UpdateCountry), route!(AccountService::update_country))
            .step(S::UpdatingPhone, Text, route!(AccountService::save_phone))
            .step(S::UpdatingCountry, Text, route!(AccountService::save_country))
            .any(Choice(C::ChangeLanguage), route!(AccountService::change_language))
            .any(Choice(C::SetLanguage), route!(AccountService::set_language))
    }
}

/// Response for an event no transition claims. Never touches the session.
pub fn fallback(turn: &Turn) -> Outcome {
    let lang = turn.language;
    match &turn.event {
        Event::File(_) => Outcome::stay().answer(t(lang, "not_expecting_photo"), None),
        Event::UnknownChoice(_) => Outcome::stay().answer(t(lang, "unknown_action"), None),
        // A step-bound button pressed outside its step: the flow it belonged to is gone
        Event::Choice(_) => Outcome::stay().answer(
            t(lang, "session_expired"),
            Some(keyboards::back_to_main(lang)),
        ),
        Event::Text(_) | Event::Command(_) if turn.state.is_some() => {
            Outcome::stay().answer(t(lang, "not_sure"), None)
        }
        Event::Text(_) | Event::Command(_) => match turn.user {
            Some(_) => Outcome::stay().answer(
                t(lang, "not_understood"),
                Some(keyboards::main_menu(lang)),
            ),
            None => Outcome::stay().answer(t(lang, "use_start"), None),
        },
    }
}
