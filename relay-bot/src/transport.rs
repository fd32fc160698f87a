//! Teloxide-backed [`Transport`] implementation. Production sends via
//! Telegram; tests substitute a recording mock.

use std::path::Path;

use async_trait::async_trait;
use bot_core::{Chat, CoreError, Keyboard, Result, Transport};
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId};

pub struct TeloxideTransport {
    bot: teloxide::Bot,
}

impl TeloxideTransport {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }
}

fn to_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.callback_data.clone()))
            .collect::<Vec<_>>()
    }))
}

fn parse_message_id(message_id: &str) -> Result<MessageId> {
    message_id
        .parse::<i32>()
        .map(MessageId)
        .map_err(|_| CoreError::Transport(format!("Invalid message_id for edit: {}", message_id)))
}

#[async_trait]
impl Transport for TeloxideTransport {
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(|e| CoreError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn send_message_and_return_id(&self, chat: &Chat, text: &str) -> Result<String> {
        let sent = self
            .bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(|e| CoreError::Transport(e.to_string()))?;
        Ok(sent.id.to_string())
    }

    async fn send_message_with_keyboard(
        &self,
        chat: &Chat,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<()> {
        self.bot
            .send_message(ChatId(chat.id), text.to_string())
            .reply_markup(to_markup(keyboard))
            .await
            .map_err(|e| CoreError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn edit_message(&self, chat: &Chat, message_id: &str, text: &str) -> Result<()> {
        let id = parse_message_id(message_id)?;
        self.bot
            .edit_message_text(ChatId(chat.id), id, text)
            .await
            .map_err(|e| CoreError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn edit_message_with_keyboard(
        &self,
        chat: &Chat,
        message_id: &str,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<()> {
        let id = parse_message_id(message_id)?;
        self.bot
            .edit_message_text(ChatId(chat.id), id, text)
            .reply_markup(to_markup(keyboard))
            .await
            .map_err(|e| CoreError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.bot
            .answer_callback_query(teloxide::types::CallbackQueryId(callback_id.to_string()))
            .await
            .map_err(|e| CoreError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn send_document(&self, chat: &Chat, path: &Path, filename: &str) -> Result<()> {
        let file = InputFile::file(path.to_path_buf()).file_name(filename.to_string());
        self.bot
            .send_document(ChatId(chat.id), file)
            .await
            .map_err(|e| CoreError::Transport(e.to_string()))?;
        Ok(())
    }
}
