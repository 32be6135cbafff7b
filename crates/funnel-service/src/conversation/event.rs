//! Inbound events
//!
//! The transport delivers [`InboundEvent`]s. Before dispatch they are
//! normalized into [`Event`]: commands are parsed, choice strings become
//! [`ChoiceTag`]s, and persistent-menu labels typed as text are mapped to
//! the choice their inline twin would send.

use super::choice::ChoiceTag;
use crate::keyboards;

/// Uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub kind: UploadKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadKind {
    Photo,
    Document { mime: Option<String> },
}

impl Upload {
    /// Photos, or documents declared as images
    pub fn is_image(&self) -> bool {
        match &self.kind {
            UploadKind::Photo => true,
            UploadKind::Document { mime } => mime.as_deref().is_some_and(|m| m.starts_with("image/")),
        }
    }
}

/// Event as delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command { name: String, args: Vec<String> },
    Choice(String),
    Text(String),
    File(Upload),
}

/// What the transport knows about the sender
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderProfile {
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`, with the referral code from a `ref_<code>` argument
    Start { referral_code: Option<String> },
    Cancel,
    Help,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Start,
    Cancel,
    Help,
    Other,
}

impl Command {
    pub fn parse(name: &str, args: &[String]) -> Self {
        match name.trim_start_matches('/').to_lowercase().as_str() {
            "start" => Self::Start {
                referral_code: args
                    .first()
                    .and_then(|arg| arg.strip_prefix("ref_"))
                    .map(str::trim)
                    .filter(|code| !code.is_empty())
                    .map(str::to_string),
            },
            "cancel" => Self::Cancel,
            "help" => Self::Help,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Start { .. } => CommandKind::Start,
            Self::Cancel => CommandKind::Cancel,
            Self::Help => CommandKind::Help,
            Self::Other(_) => CommandKind::Other,
        }
    }
}

/// Normalized event handed to transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(Command),
    Choice(ChoiceTag),
    /// Callback data that parsed as no known choice
    UnknownChoice(String),
    Text(String),
    File(Upload),
}

impl Event {
    pub fn normalize(inbound: InboundEvent) -> Self {
        match inbound {
            InboundEvent::Command { name, args } => Self::Command(Command::parse(&name, &args)),
            InboundEvent::Choice(raw) => match raw.parse() {
                Ok(tag) => Self::Choice(tag),
                Err(_) => Self::UnknownChoice(raw),
            },
            InboundEvent::Text(text) => match keyboards::menu_choice(&text) {
                Some(tag) => Self::Choice(tag),
                None => Self::Text(text),
            },
            InboundEvent::File(upload) => Self::File(upload),
        }
    }

    /// Whether the event came from pressing an inline button
    pub fn is_button(&self) -> bool {
        matches!(self, Self::Choice(_) | Self::UnknownChoice(_))
    }
}
