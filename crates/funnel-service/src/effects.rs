//! Side-effect dispatcher
//!
//! Runs the effects a transition or sweep produced, after the session has
//! been committed. Every failure here is logged and swallowed: a lost
//! notification never undoes the state change that caused it.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::broadcast::{BroadcastReport, Broadcaster};
use crate::conversation::{Effect, Handled};
use crate::i18n::text;
use crate::services::ServiceContext;

#[derive(Clone)]
pub struct EffectRunner {
    ctx: Arc<ServiceContext>,
}

impl std::fmt::Debug for EffectRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRunner").finish_non_exhaustive()
    }
}

impl EffectRunner {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Run effects in order. Broadcasts are spawned; their handles are
    /// returned so callers can await them.
    pub async fn run_all(&self, effects: Vec<Effect>) -> Handled {
        let mut handled = Handled::default();
        for effect in effects {
            if let Some(job) = self.run(effect).await {
                handled.background.push(job);
            }
        }
        handled
    }

    pub async fn run(&self, effect: Effect) -> Option<JoinHandle<BroadcastReport>> {
        match effect {
            Effect::Notify { to, text, keyboard } => {
                if let Err(e) = self.ctx.transport().send_text(to, &text, keyboard.as_ref()).await {
                    warn!(user_id = %to, error = %e, "Notification failed");
                }
                None
            }
            Effect::Email(message) => {
                match self.ctx.mailer().send(&message).await {
                    Ok(()) => debug!(to = %message.to, "Email sent"),
                    Err(e) => warn!(to = %message.to, error = %e, "Email failed"),
                }
                None
            }
            Effect::GroupInvite {
                user_id,
                group,
                language,
            } => {
                let transport = self.ctx.transport();
                match transport.create_group_invite(group, 1).await {
                    Ok(link) => {
                        let message = text(language, "group_invite", &[("link", &link)]);
                        if let Err(e) = transport.send_text(user_id, &message, None).await {
                            warn!(user_id = %user_id, error = %e, "Invite delivery failed");
                        }
                    }
                    Err(e) => warn!(user_id = %user_id, group, error = %e, "Invite link failed"),
                }
                None
            }
            Effect::Broadcast(job) => {
                let ctx = Arc::clone(&self.ctx);
                Some(tokio::spawn(async move {
                    Broadcaster::new(&ctx).run(&job).await
                }))
            }
        }
    }
}
