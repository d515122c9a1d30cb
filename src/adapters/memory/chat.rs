//! Chat sender that records outbound messages.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::domain::foundation::ChatId;
use crate::ports::{ChatError, ChatSender, OutboundMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat: ChatId,
    pub message: OutboundMessage,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingChat {
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl RecordingChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Texts of every message sent, in order.
    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.message.text).collect()
    }

    pub fn last(&self) -> Option<OutboundMessage> {
        self.sent().pop().map(|m| m.message)
    }

    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }
}

#[async_trait]
impl ChatSender for RecordingChat {
    async fn send(&self, chat: ChatId, message: OutboundMessage) -> Result<(), ChatError> {
        self.sent
            .lock()
            .map_err(|_| ChatError::Transport("recording lock poisoned".into()))?
            .push(SentMessage { chat, message });
        Ok(())
    }
}
