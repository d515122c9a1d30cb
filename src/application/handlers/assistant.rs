//! Assistant - entry point for inbound chat events.
//!
//! Routes text, voice and button events through the session state machine:
//!
//! ```text
//! Idle ──text──▶ AwaitingClarification ──text/button──▶ ... ──▶ Previewing
//! Previewing ──edit──▶ AwaitingRefine ──text──▶ Previewing
//! Previewing ──confirm/cancel──▶ Idle
//! any active ──timer──▶ Expired ──button──▶ resumed / ──text──▶ reset
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::extraction::TaskFieldEdit;
use crate::domain::foundation::{ChatId, SessionKey, UserId, ValidationError};
use crate::domain::session::{CallbackAction, ConversationMode, ConversationState, Keyboard};
use crate::ports::{
    ChatError, ChatSender, Oracle, OutboundMessage, Transcriber, FALLBACK_REFUSAL,
};

use super::apply::ApplyEngine;
use super::orchestrator::{Extraction, ExtractionOrchestrator};
use super::preview::PreviewRenderer;
use super::session_manager::SessionManager;

const REFINE_HINT: &str = "Describe what to change, in text or as a voice message.\n\
For example: 'in task 1 move the deadline to tomorrow 14:00 and set priority high'.\n\
Or edit a field directly:\ntask: 1\nfield: priority\nvalue: high";

/// Who sent an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Text(String),
    /// Local path of a downloaded voice message.
    Voice(PathBuf),
    /// Callback data of a pressed button.
    Callback(String),
}

/// One inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat: ChatId,
    pub sender: Sender,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.chat, self.sender.id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("invalid session transition: {0}")]
    State(#[from] ValidationError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub struct Assistant {
    sessions: Arc<SessionManager>,
    orchestrator: ExtractionOrchestrator,
    renderer: PreviewRenderer,
    /// `None` when no store is configured; confirm then echoes JSON.
    applier: Option<ApplyEngine>,
    oracle: Arc<dyn Oracle>,
    chat: Arc<dyn ChatSender>,
    transcriber: Option<Arc<dyn Transcriber>>,
    /// `None` lets everyone in.
    allowed_user: Option<UserId>,
}

impl Assistant {
    pub fn new(
        sessions: Arc<SessionManager>,
        orchestrator: ExtractionOrchestrator,
        renderer: PreviewRenderer,
        oracle: Arc<dyn Oracle>,
        chat: Arc<dyn ChatSender>,
    ) -> Self {
        Self {
            sessions,
            orchestrator,
            renderer,
            applier: None,
            oracle,
            chat,
            transcriber: None,
            allowed_user: None,
        }
    }

    pub fn with_applier(mut self, applier: ApplyEngine) -> Self {
        self.applier = Some(applier);
        self
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_allowed_user(mut self, user: Option<UserId>) -> Self {
        self.allowed_user = user;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Handles one event. The user's session stays locked until it returns.
    pub async fn handle(&self, event: InboundEvent) -> Result<(), AssistantError> {
        if !self.authorize(&event).await? {
            return Ok(());
        }

        let key = event.key();
        self.sessions.touch(key).await;
        let session = self.sessions.session(key).await;
        let mut state = session.lock().await;

        let outcome = match event.kind {
            EventKind::Text(text) => self.handle_text(&mut state, &text).await,
            EventKind::Voice(path) => self.handle_voice(&mut state, path).await,
            EventKind::Callback(data) => self.handle_callback(&mut state, &data).await,
        };
        // The inactivity window starts when the reply is out.
        self.sessions.touch(key).await;
        outcome
    }

    async fn authorize(&self, event: &InboundEvent) -> Result<bool, AssistantError> {
        match self.allowed_user {
            Some(allowed) if allowed != event.sender.id => {}
            _ => return Ok(true),
        }

        warn!(
            user_id = event.sender.id.value(),
            user_name = %event.sender.name,
            "Unauthorized access attempt"
        );
        let refusal = match self.oracle.refusal(&event.sender.name).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => FALLBACK_REFUSAL.to_string(),
            Err(e) => {
                debug!(error = %e, "Refusal generation failed, using canned text");
                FALLBACK_REFUSAL.to_string()
            }
        };
        self.say(event.chat, refusal).await?;
        Ok(false)
    }

    async fn handle_text(
        &self,
        state: &mut ConversationState,
        text: &str,
    ) -> Result<(), AssistantError> {
        let chat = state.key().chat_id;
        if state.reset_if_expired() {
            info!(session = %state.key(), "Expired session reset by new message");
        }

        let text = text.trim();
        if text.is_empty() {
            return self.say(chat, "Empty message.").await;
        }

        match state.mode() {
            ConversationMode::AwaitingRefine => self.refine(state, text).await,
            ConversationMode::AwaitingClarification => {
                let input = state.input_for(text);
                let extraction = self.orchestrator.extract(&input).await;
                self.present(state, input, extraction).await
            }
            _ => {
                let extraction = self.orchestrator.extract(text).await;
                self.present(state, text.to_string(), extraction).await
            }
        }
    }

    async fn handle_voice(
        &self,
        state: &mut ConversationState,
        audio: PathBuf,
    ) -> Result<(), AssistantError> {
        let chat = state.key().chat_id;
        let Some(transcriber) = &self.transcriber else {
            return self.say(chat, "Voice messages are not supported here.").await;
        };

        match transcriber.transcribe(&audio).await {
            Ok(transcript) if transcript.trim().is_empty() => {
                self.say(chat, "Could not recognize any speech.").await
            }
            Ok(transcript) => {
                info!(session = %state.key(), chars = transcript.len(), "Transcribed voice message");
                self.handle_text(state, &transcript).await
            }
            Err(e) => {
                warn!(error = %e, path = %audio.display(), "Transcription failed");
                self.say(chat, format!("Failed to recognize the voice message: {e}")).await
            }
        }
    }

    async fn handle_callback(
        &self,
        state: &mut ConversationState,
        data: &str,
    ) -> Result<(), AssistantError> {
        let chat = state.key().chat_id;
        let Some(action) = CallbackAction::parse(data) else {
            debug!(data, "Ignoring unknown callback");
            return Ok(());
        };

        if state.mode() == ConversationMode::Expired {
            let resumed = state.resume();
            info!(session = %state.key(), mode = ?resumed, "Expired session resumed by button");
        }

        match action {
            CallbackAction::PreviewCancel => {
                state.reset();
                self.say(chat, "Cancelled. Send a new message to start over.").await
            }
            CallbackAction::PreviewEdit if state.mode() == ConversationMode::AwaitingRefine => {
                self.say(chat, REFINE_HINT).await
            }
            CallbackAction::PreviewEdit => match state.begin_refine() {
                Ok(()) => self.say(chat, REFINE_HINT).await,
                Err(_) => self.say(chat, "Nothing to edit. Send a new message.").await,
            },
            CallbackAction::PreviewConfirm => self.confirm(state).await,
            CallbackAction::ClarifyProject(project) => {
                let Some(original) = state.original_input().map(String::from) else {
                    return self.say(chat, "There is no original text to clarify.").await;
                };
                let (combined, extraction) = self
                    .orchestrator
                    .clarify_with_project(&original, project.as_deref())
                    .await;
                self.present(state, combined, extraction).await
            }
        }
    }

    /// Moves the session according to an extraction and replies.
    async fn present(
        &self,
        state: &mut ConversationState,
        input: String,
        extraction: Extraction,
    ) -> Result<(), AssistantError> {
        let chat = state.key().chat_id;
        let Extraction { result, next_mode } = extraction;

        if next_mode == ConversationMode::AwaitingClarification {
            let questions = result.open_questions();
            let mut message = format!(
                "Need some clarifications:\n{}",
                self.renderer.format_questions(&questions)
            );
            let keyboard = self.renderer.question_keyboard(&questions);
            if keyboard.is_none() {
                message.push_str("\n\nAnswer in a single message.");
            }
            state.await_clarification(input, result)?;
            info!(
                session = %state.key(),
                round = state.clarification_rounds(),
                "Awaiting clarification"
            );
            let message = OutboundMessage::text(message);
            let message = match keyboard {
                Some(keyboard) => message.with_keyboard(keyboard),
                None => message,
            };
            return self.send(chat, message).await;
        }

        if result.is_query_only() {
            // Nothing to confirm: answer and finish.
            let answer = result.answer().unwrap_or_default().to_string();
            state.reset();
            return self.say(chat, answer).await;
        }

        let preview = self.renderer.render(&result, &input).await;
        state.preview(input, result)?;
        self.send(chat, OutboundMessage::text(preview).with_keyboard(Keyboard::preview()))
            .await
    }

    async fn refine(&self, state: &mut ConversationState, text: &str) -> Result<(), AssistantError> {
        let chat = state.key().chat_id;
        let Some(current) = state.pending_result().cloned() else {
            state.reset();
            return self.say(chat, "Nothing to edit. Send a new message.").await;
        };
        let original = state.original_input().unwrap_or_default().to_string();

        let refined = match TaskFieldEdit::parse(text) {
            Ok(Some(edit)) => {
                let mut edited = current;
                if let Err(e) = edit.apply(&mut edited) {
                    return self.say(chat, format!("Could not apply the edit: {e}")).await;
                }
                debug!(task = edit.task_number, "Applied manual field edit");
                edited
            }
            Err(e) => return self.say(chat, format!("Could not apply the edit: {e}")).await,
            Ok(None) => self.orchestrator.refine(&original, &current, text).await,
        };

        let preview = self.renderer.render(&refined, &original).await;
        state.refined(refined)?;
        self.send(chat, OutboundMessage::text(preview).with_keyboard(Keyboard::preview()))
            .await
    }

    async fn confirm(&self, state: &mut ConversationState) -> Result<(), AssistantError> {
        let chat = state.key().chat_id;
        // A result still waiting for answers is not confirmable.
        if !matches!(
            state.mode(),
            ConversationMode::Previewing | ConversationMode::AwaitingRefine
        ) {
            return self.say(chat, "Nothing to confirm.").await;
        }
        let Some((result, original)) = state.take_for_apply() else {
            return self.say(chat, "Nothing to confirm.").await;
        };

        match &self.applier {
            None => {
                let json = serde_json::to_string_pretty(&result)?;
                self.say(chat, json).await?;
            }
            Some(applier) => {
                let report = applier.apply(&result, &original).await;
                if !report.created.is_empty() {
                    let context = format!(
                        "Task creation confirmation. {} item(s) created.",
                        report.created.len()
                    );
                    let text = applier.personalize(&report.created, &context).await;
                    self.say(chat, text).await?;
                }
                if !report.updated.is_empty() {
                    let context = format!(
                        "Task update confirmation. {} item(s) updated.",
                        report.updated.len()
                    );
                    let text = applier.personalize(&report.updated, &context).await;
                    self.say(chat, text).await?;
                }
            }
        }

        if let Some(answer) = result.answer() {
            self.say(chat, answer).await?;
        }
        info!(session = %state.key(), "Confirmed result applied");
        Ok(())
    }

    async fn say(&self, chat: ChatId, text: impl Into<String>) -> Result<(), AssistantError> {
        self.send(chat, OutboundMessage::text(text)).await
    }

    async fn send(&self, chat: ChatId, message: OutboundMessage) -> Result<(), AssistantError> {
        self.chat.send(chat, message).await?;
        Ok(())
    }
}
