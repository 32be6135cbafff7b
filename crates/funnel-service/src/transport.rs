//! Chat transport port
//!
//! The conversation engine talks to the messaging platform only through
//! [`Transport`]. Inline keyboards carry [`ChoiceTag`]s, never raw strings,
//! so every button the bot renders is one the dispatch table can route.

use async_trait::async_trait;
use funnel_core::UserId;

use crate::conversation::ChoiceTag;

/// Opaque handle of a message the bot sent, used to edit it later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef(pub i64);

/// Transport failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The recipient blocked the bot or never started a chat with it
    #[error("recipient unreachable: {0}")]
    Unreachable(UserId),

    /// Nothing to edit, or the message can no longer be edited
    #[error("message cannot be edited")]
    NotEditable,

    #[error("transport request failed: {0}")]
    Request(String),
}

/// What pressing a button does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Choice(ChoiceTag),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn choice(label: impl Into<String>, tag: ChoiceTag) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Choice(tag),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }
}

/// Inline keyboard attached to a message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row with a single button
    pub fn button(mut self, label: impl Into<String>, tag: ChoiceTag) -> Self {
        self.rows.push(vec![Button::choice(label, tag)]);
        self
    }

    /// Append a row with a single link button
    pub fn link(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.rows.push(vec![Button::url(label, url)]);
        self
    }

    /// Append a row of buttons
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        if !buttons.is_empty() {
            self.rows.push(buttons);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every choice reachable from this keyboard, in row order
    pub fn choices(&self) -> impl Iterator<Item = &ChoiceTag> {
        self.rows.iter().flatten().filter_map(|b| match &b.action {
            ButtonAction::Choice(tag) => Some(tag),
            ButtonAction::Url(_) => None,
        })
    }
}

/// Outbound side of the chat platform
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a new message
    async fn send_text(
        &self,
        to: UserId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError>;

    /// Replace the text and keyboard of a message sent earlier
    async fn edit_text(
        &self,
        to: UserId,
        message: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError>;

    /// Edit the message whose button triggered the current event
    async fn edit_last_message(
        &self,
        to: UserId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError>;

    /// Send a message that installs a persistent reply keyboard
    async fn present_persistent_menu(
        &self,
        to: UserId,
        text: &str,
        rows: &[Vec<String>],
    ) -> Result<(), TransportError>;

    /// One-time invite link to a group chat
    async fn create_group_invite(&self, group: i64, member_limit: u32)
        -> Result<String, TransportError>;
}
