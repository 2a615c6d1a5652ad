use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    Result,
};

/// Outbound calls the handlers make to the chat platform.
///
/// Telegram is the only implementation; tests use recording fakes.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Send a plain-text message (no markup parsing).
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    /// Send a message parsed as Telegram MarkdownV2.
    async fn send_markdown(&self, chat_id: ChatId, markdown: &str) -> Result<MessageRef>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;
}
