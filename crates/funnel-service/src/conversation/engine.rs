//! Conversation engine
//!
//! One call per inbound event. Events from the same user are serialized by
//! a per-user mutex held across load → transition → commit → reply; events
//! from different users never wait on each other. Side effects run after
//! the lock is released.

use std::sync::Arc;

use dashmap::DashMap;
use funnel_core::{Language, UserId};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, instrument, warn};

use super::dispatch::{fallback, DispatchTable, EventKey, Turn};
use super::event::{Event, InboundEvent, SenderProfile};
use super::outcome::{Effect, Outcome, Reply, SessionChange};
use super::state::SessionState;
use crate::broadcast::BroadcastReport;
use crate::effects::EffectRunner;
use crate::i18n::t;
use crate::keyboards;
use crate::services::{ServiceContext, ServiceError, ServiceResult};

/// Background work started while handling an event
#[derive(Debug, Default)]
pub struct Handled {
    pub background: Vec<JoinHandle<BroadcastReport>>,
}

impl Handled {
    /// Wait for every background job
    pub async fn finish(self) -> Vec<BroadcastReport> {
        let mut reports = Vec::with_capacity(self.background.len());
        for job in self.background {
            match job.await {
                Ok(report) => reports.push(report),
                Err(e) => error!(error = %e, "Background job panicked"),
            }
        }
        reports
    }
}

pub struct ConversationEngine {
    ctx: Arc<ServiceContext>,
    table: DispatchTable,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
    runner: EffectRunner,
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("table", &self.table)
            .field("locked_users", &self.locks.len())
            .finish_non_exhaustive()
    }
}

impl ConversationEngine {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self::with_table(ctx, DispatchTable::standard())
    }

    pub fn with_table(ctx: Arc<ServiceContext>, table: DispatchTable) -> Self {
        let runner = EffectRunner::new(Arc::clone(&ctx));
        Self {
            ctx,
            table,
            locks: DashMap::new(),
            runner,
        }
    }

    pub fn context(&self) -> &Arc<ServiceContext> {
        &self.ctx
    }

    pub fn runner(&self) -> &EffectRunner {
        &self.runner
    }

    /// Handle one inbound event end to end
    #[instrument(skip(self, sender, inbound), fields(user_id = %user_id))]
    pub async fn handle(
        &self,
        user_id: UserId,
        sender: SenderProfile,
        inbound: InboundEvent,
    ) -> Handled {
        let lock = Arc::clone(&self.locks.entry(user_id).or_default());
        let effects = {
            let _guard = lock.lock().await;
            self.process(user_id, sender, inbound).await
        };
        drop(lock);
        self.locks
            .remove_if(&user_id, |_, lock| Arc::strong_count(lock) == 1);

        self.runner.run_all(effects).await
    }

    /// Load, transition, commit, reply. Returns the effects to run.
    async fn process(
        &self,
        user_id: UserId,
        sender: SenderProfile,
        inbound: InboundEvent,
    ) -> Vec<Effect> {
        let ctx = self.ctx.as_ref();
        let event = Event::normalize(inbound);
        let is_button = event.is_button();

        let user = match ctx.users().find_by_id(user_id).await {
            Ok(user) => user,
            Err(e) => {
                error!(error = %e, "Failed to load user");
                self.deliver(user_id, is_button, &failure(Language::En, false).replies)
                    .await;
                return Vec::new();
            }
        };
        let state = match self.load_state(user_id).await {
            Ok(state) => state,
            Err(e) => {
                error!(error = %e, "Failed to load session");
                let lang = user.as_ref().map(|u| u.language).unwrap_or_default();
                self.deliver(user_id, is_button, &failure(lang, user.is_some()).replies)
                    .await;
                return Vec::new();
            }
        };

        let language = user
            .as_ref()
            .map(|u| u.language)
            .or_else(|| state.as_ref().and_then(SessionState::pending_language))
            .unwrap_or_default();
        let registered = user.is_some();
        let step = state.as_ref().map(SessionState::kind);
        let key = EventKey::of(&event);

        let turn = Turn {
            user_id,
            sender,
            user,
            language,
            state,
            event,
            now: ctx.now(),
        };

        let outcome = match self.table.resolve(step, key) {
            Some(transition) => match transition(ctx, turn).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    log_failure(&e);
                    error_outcome(&e, language, registered)
                }
            },
            None => fallback(&turn),
        };

        if let Err(e) = self.commit(user_id, &outcome.session).await {
            error!(error = %e, "Failed to save session");
            self.deliver(user_id, is_button, &failure(language, registered).replies)
                .await;
            return Vec::new();
        }

        self.deliver(user_id, is_button, &outcome.replies).await;
        outcome.effects
    }

    /// Stored session, with an unreadable record treated as no session
    async fn load_state(&self, user_id: UserId) -> ServiceResult<Option<SessionState>> {
        let Some(record) = self.ctx.sessions().get(user_id).await? else {
            return Ok(None);
        };
        match SessionState::from_record(&record) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!(step = %record.step, error = %e, "Ignoring unreadable session");
                Ok(None)
            }
        }
    }

    async fn commit(&self, user_id: UserId, change: &SessionChange) -> ServiceResult<()> {
        match change {
            SessionChange::Keep => Ok(()),
            SessionChange::Put(state) => {
                let (step, payload) = state
                    .to_parts()
                    .map_err(|e| ServiceError::internal(format!("session encode: {e}")))?;
                self.ctx.sessions().put(user_id, &step, &payload).await?;
                Ok(())
            }
            SessionChange::Clear => {
                self.ctx.sessions().clear(user_id).await?;
                Ok(())
            }
        }
    }

    /// Send replies in order. The first `Answer` to a button press edits
    /// the pressed message, falling back to a new message.
    async fn deliver(&self, user_id: UserId, is_button: bool, replies: &[Reply]) {
        let transport = self.ctx.transport();
        let mut may_edit = is_button;

        for reply in replies {
            let result = match reply {
                Reply::Answer { text, keyboard } if may_edit => {
                    may_edit = false;
                    match transport
                        .edit_last_message(user_id, text, keyboard.as_ref())
                        .await
                    {
                        Ok(()) => Ok(()),
                        Err(_) => transport
                            .send_text(user_id, text, keyboard.as_ref())
                            .await
                            .map(|_| ()),
                    }
                }
                Reply::Answer { text, keyboard } | Reply::Send { text, keyboard } => transport
                    .send_text(user_id, text, keyboard.as_ref())
                    .await
                    .map(|_| ()),
                Reply::Menu { text, rows } => {
                    transport.present_persistent_menu(user_id, text, rows).await
                }
            };
            if let Err(e) = result {
                warn!(error = %e, "Reply delivery failed");
            }
        }
    }
}

fn log_failure(e: &ServiceError) {
    if e.is_retryable() {
        error!(code = e.error_code(), error = %e, "Transition failed");
    } else {
        warn!(code = e.error_code(), error = %e, "Transition refused");
    }
}

/// Generic failure reply; the session is left as it was
fn failure(lang: Language, registered: bool) -> Outcome {
    Outcome::stay().answer(t(lang, "error_general"), Some(menu_for(lang, registered)))
}

fn error_outcome(e: &ServiceError, lang: Language, registered: bool) -> Outcome {
    match e {
        ServiceError::PermissionDenied { .. } => {
            Outcome::stay().answer(t(lang, "access_denied"), None)
        }
        ServiceError::NotFound { .. } => Outcome::stay().answer(
            t(lang, "session_expired"),
            Some(menu_for(lang, registered)),
        ),
        _ => failure(lang, registered),
    }
}

fn menu_for(lang: Language, registered: bool) -> crate::transport::Keyboard {
    if registered {
        keyboards::back_to_main(lang)
    } else {
        keyboards::welcome(lang)
    }
}
