//! Chat transport over stdout, for local runs.
//!
//! Buttons are printed with the `/cb` command that presses them.

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use crate::domain::foundation::ChatId;
use crate::domain::session::Keyboard;
use crate::ports::{ChatError, ChatSender, OutboundMessage};

pub struct ConsoleChat {
    out: Mutex<Stdout>,
}

impl Default for ConsoleChat {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleChat {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }
}

pub fn render(message: &OutboundMessage) -> String {
    let mut text = format!("{}\n", message.text);
    if let Some(keyboard) = &message.keyboard {
        text.push_str(&render_keyboard(keyboard));
    }
    text
}

fn render_keyboard(keyboard: &Keyboard) -> String {
    keyboard
        .rows
        .iter()
        .map(|row| {
            let buttons: Vec<String> = row
                .iter()
                .map(|b| format!("[{}] /cb {}", b.label, b.data))
                .collect();
            format!("  {}\n", buttons.join("   "))
        })
        .collect()
}

#[async_trait]
impl ChatSender for ConsoleChat {
    async fn send(&self, _chat: ChatId, message: OutboundMessage) -> Result<(), ChatError> {
        let mut out = self.out.lock().await;
        out.write_all(render(&message).as_bytes())
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        out.flush()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))
    }
}
