//! Update handlers
//!
//! Translate Telegram updates into [`InboundEvent`]s and hand them to the
//! conversation engine. Only private chats are served.

use std::sync::Arc;

use funnel_core::UserId;
use funnel_service::{ConversationEngine, InboundEvent, SenderProfile, Upload, UploadKind};
use teloxide::prelude::*;
use teloxide::types::{FileId, User};
use tracing::{debug, warn};

use super::transport::TelegramTransport;

/// A message before any file it carries has been downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Ready(InboundEvent),
    File { file_id: FileId, kind: UploadKind },
}

/// Classify a message; `None` for content the bot ignores
pub fn classify(msg: &Message) -> Option<Incoming> {
    if let Some(text) = msg.text() {
        return Some(Incoming::Ready(parse_text(text)));
    }
    if let Some(photo) = msg.photo().and_then(<[_]>::last) {
        return Some(Incoming::File {
            file_id: photo.file.id.clone(),
            kind: UploadKind::Photo,
        });
    }
    if let Some(document) = msg.document() {
        return Some(Incoming::File {
            file_id: document.file.id.clone(),
            kind: UploadKind::Document {
                mime: document.mime_type.as_ref().map(ToString::to_string),
            },
        });
    }
    None
}

/// `/start ref_abc` becomes a command, anything else plain text
pub fn parse_text(text: &str) -> InboundEvent {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix('/') {
        let mut parts = rest.split_whitespace();
        let head = parts.next().unwrap_or_default();
        // `/start@SomeBot` in group-style mentions
        let name = head.split('@').next().unwrap_or(head).to_string();
        if !name.is_empty() {
            return InboundEvent::Command {
                name,
                args: parts.map(str::to_string).collect(),
            };
        }
    }
    InboundEvent::Text(text.to_string())
}

fn sender(user: &User) -> (UserId, SenderProfile) {
    (
        UserId::new(user.id.0 as i64),
        SenderProfile {
            username: user.username.clone(),
            first_name: Some(user.first_name.clone()),
        },
    )
}

pub async fn on_message(
    msg: Message,
    engine: Arc<ConversationEngine>,
    transport: Arc<TelegramTransport>,
) -> ResponseResult<()> {
    if !msg.chat.is_private() {
        return Ok(());
    }
    let Some(from) = msg.from.as_ref().filter(|u| !u.is_bot) else {
        return Ok(());
    };
    let (user_id, profile) = sender(from);

    let event = match classify(&msg) {
        Some(Incoming::Ready(event)) => event,
        Some(Incoming::File { file_id, kind }) => match transport.download(&file_id).await {
            Ok(bytes) => InboundEvent::File(Upload { bytes, kind }),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Upload download failed");
                return Ok(());
            }
        },
        None => {
            debug!(user_id = %user_id, "Ignoring unsupported message");
            return Ok(());
        }
    };

    engine.handle(user_id, profile, event).await;
    Ok(())
}

pub async fn on_callback(
    bot: Bot,
    query: CallbackQuery,
    engine: Arc<ConversationEngine>,
    transport: Arc<TelegramTransport>,
) -> ResponseResult<()> {
    // Stop the client spinner whatever happens next
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        debug!(error = %e, "Callback answer failed");
    }

    let Some(data) = query.data.clone() else {
        return Ok(());
    };
    let (user_id, profile) = sender(&query.from);
    if let Some(message) = query.message.as_ref() {
        transport.remember_pressed(user_id, message.id());
    }

    engine
        .handle(user_id, profile, InboundEvent::Choice(data))
        .await;
    Ok(())
}
