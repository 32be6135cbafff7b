//! Transition results
//!
//! A transition never talks to the transport or the mailer directly. It
//! returns the session change, the replies for the acting user and a list
//! of side effects; the engine commits the session first, then replies,
//! then hands the effects to the [`EffectRunner`](crate::effects::EffectRunner).

use funnel_core::{Language, UserId};

use super::state::SessionState;
use crate::broadcast::BroadcastJob;
use crate::mail::EmailMessage;
use crate::transport::Keyboard;

/// What happens to the acting user's session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionChange {
    #[default]
    Keep,
    Put(SessionState),
    Clear,
}

/// Message to the acting user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Edit the message whose button was pressed, or send when the event
    /// was not a button press or the edit fails
    Answer {
        text: String,
        keyboard: Option<Keyboard>,
    },
    /// Always a new message
    Send {
        text: String,
        keyboard: Option<Keyboard>,
    },
    /// Install the persistent reply keyboard
    Menu { text: String, rows: Vec<Vec<String>> },
}

/// Side effect executed after the session change commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Chat message to someone other than the acting user
    Notify {
        to: UserId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Email(EmailMessage),
    /// Single-use invite to a service group, delivered as a chat message
    GroupInvite {
        user_id: UserId,
        group: i64,
        language: Language,
    },
    Broadcast(BroadcastJob),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub session: SessionChange,
    pub replies: Vec<Reply>,
    pub effects: Vec<Effect>,
}

impl Outcome {
    /// No session change, no replies
    pub fn stay() -> Self {
        Self::default()
    }

    pub fn put(state: SessionState) -> Self {
        Self {
            session: SessionChange::Put(state),
            ..Self::default()
        }
    }

    pub fn clear() -> Self {
        Self {
            session: SessionChange::Clear,
            ..Self::default()
        }
    }

    pub fn answer(mut self, text: impl Into<String>, keyboard: Option<Keyboard>) -> Self {
        self.replies.push(Reply::Answer {
            text: text.into(),
            keyboard,
        });
        self
    }

    pub fn send(mut self, text: impl Into<String>, keyboard: Option<Keyboard>) -> Self {
        self.replies.push(Reply::Send {
            text: text.into(),
            keyboard,
        });
        self
    }

    pub fn menu(mut self, text: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        self.replies.push(Reply::Menu {
            text: text.into(),
            rows,
        });
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// Text of every reply, in order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.replies.iter().map(|r| match r {
            Reply::Answer { text, .. } | Reply::Send { text, .. } | Reply::Menu { text, .. } => {
                text.as_str()
            }
        })
    }
}
