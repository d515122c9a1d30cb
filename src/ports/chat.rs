//! Chat Port - outbound messages to the user.

use async_trait::async_trait;

use crate::domain::foundation::ChatId;
use crate::domain::session::Keyboard;

/// A reply, optionally with inline buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send(&self, chat: ChatId, message: OutboundMessage) -> Result<(), ChatError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat transport failed: {0}")]
    Transport(String),
}
