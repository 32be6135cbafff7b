//! Telegram implementation of [`Transport`]

use async_trait::async_trait;
use dashmap::DashMap;
use funnel_core::UserId;
use funnel_service::{Button, ButtonAction, Keyboard, MessageRef, Transport, TransportError};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    FileId, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, MessageId,
};
use teloxide::{ApiError, RequestError};
use tracing::{debug, warn};

pub struct TelegramTransport {
    bot: Bot,
    /// Message carrying the button each user pressed last
    pressed: DashMap<UserId, MessageId>,
}

impl std::fmt::Debug for TelegramTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramTransport")
            .field("pressed", &self.pressed.len())
            .finish_non_exhaustive()
    }
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            pressed: DashMap::new(),
        }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Record the message whose button `user` just pressed
    pub fn remember_pressed(&self, user: UserId, message: MessageId) {
        self.pressed.insert(user, message);
    }

    /// Fetch an uploaded file's bytes
    pub async fn download(&self, file_id: &FileId) -> Result<Vec<u8>, TransportError> {
        let file = self
            .bot
            .get_file(file_id.clone())
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let mut bytes = Vec::with_capacity(file.size as usize);
        self.bot
            .download_file(&file.path, &mut bytes)
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        debug!(size = bytes.len(), "File downloaded");
        Ok(bytes)
    }
}

fn chat(user: UserId) -> ChatId {
    ChatId(user.into_inner())
}

fn map_error(to: UserId, e: RequestError) -> TransportError {
    match e {
        RequestError::Api(ApiError::BotBlocked | ApiError::UserDeactivated | ApiError::ChatNotFound) => {
            TransportError::Unreachable(to)
        }
        RequestError::Api(ApiError::MessageToEditNotFound | ApiError::MessageCantBeEdited) => {
            TransportError::NotEditable
        }
        other => TransportError::Request(other.to_string()),
    }
}

/// Inline markup; link buttons with an unparsable URL are dropped
pub fn inline_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    let rows = keyboard
        .rows
        .iter()
        .map(|row| row.iter().filter_map(inline_button).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

fn inline_button(button: &Button) -> Option<InlineKeyboardButton> {
    match &button.action {
        ButtonAction::Choice(tag) => Some(InlineKeyboardButton::callback(
            button.label.clone(),
            tag.to_string(),
        )),
        ButtonAction::Url(raw) => match reqwest::Url::parse(raw) {
            Ok(url) => Some(InlineKeyboardButton::url(button.label.clone(), url)),
            Err(e) => {
                warn!(url = %raw, error = %e, "Dropping link button");
                None
            }
        },
    }
}

fn reply_markup(rows: &[Vec<String>]) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.iter()
            .map(|row| row.iter().map(KeyboardButton::new).collect::<Vec<_>>())
            .collect::<Vec<_>>(),
    )
    .resize_keyboard()
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(
        &self,
        to: UserId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        let mut request = self.bot.send_message(chat(to), text);
        if let Some(keyboard) = keyboard.filter(|k| !k.is_empty()) {
            request = request.reply_markup(inline_markup(keyboard));
        }
        let message = request.await.map_err(|e| map_error(to, e))?;
        Ok(MessageRef(i64::from(message.id.0)))
    }

    async fn edit_text(
        &self,
        to: UserId,
        message: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        let mut request = self
            .bot
            .edit_message_text(chat(to), MessageId(message.0 as i32), text);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(inline_markup(keyboard));
        }
        match request.await {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(map_error(to, e)),
        }
    }

    async fn edit_last_message(
        &self,
        to: UserId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        let Some((_, message)) = self.pressed.remove(&to) else {
            return Err(TransportError::NotEditable);
        };
        self.edit_text(to, MessageRef(i64::from(message.0)), text, keyboard)
            .await
    }

    async fn present_persistent_menu(
        &self,
        to: UserId,
        text: &str,
        rows: &[Vec<String>],
    ) -> Result<(), TransportError> {
        self.bot
            .send_message(chat(to), text)
            .reply_markup(reply_markup(rows))
            .await
            .map_err(|e| map_error(to, e))?;
        Ok(())
    }

    async fn create_group_invite(
        &self,
        group: i64,
        member_limit: u32,
    ) -> Result<String, TransportError> {
        let link = self
            .bot
            .create_chat_invite_link(ChatId(group))
            .member_limit(member_limit)
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(link.invite_link)
    }
}
