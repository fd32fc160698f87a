//! Chat transport abstraction: send and edit messages, answer callbacks,
//! deliver documents. Implementations map to a concrete transport (Telegram
//! in relay-bot); tests substitute a recording mock.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Chat, Keyboard};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a text message to the given chat.
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()>;

    /// Sends a message and returns its id so it can be edited later
    /// (the placeholder for streamed replies).
    async fn send_message_and_return_id(&self, chat: &Chat, text: &str) -> Result<String>;

    /// Sends a message with an inline keyboard attached.
    async fn send_message_with_keyboard(
        &self,
        chat: &Chat,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<()>;

    /// Edits an already-sent message. `message_id` is transport-specific.
    async fn edit_message(&self, chat: &Chat, message_id: &str, text: &str) -> Result<()>;

    /// Edits a message and replaces its inline keyboard.
    async fn edit_message_with_keyboard(
        &self,
        chat: &Chat,
        message_id: &str,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<()>;

    /// Acknowledges a callback query so the client stops its spinner.
    async fn answer_callback(&self, callback_id: &str) -> Result<()>;

    /// Sends a local file as a document attachment.
    async fn send_document(&self, chat: &Chat, path: &Path, filename: &str) -> Result<()>;
}
