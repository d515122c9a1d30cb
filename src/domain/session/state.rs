//! Conversation mode machine and the per-user state it governs.

use serde::{Deserialize, Serialize};

use crate::domain::extraction::ExtractionResult;
use crate::domain::foundation::{SessionKey, StateMachine, ValidationError};

const ANSWERS_SEPARATOR: &str = "\n\nUser answers:\n";

/// Where a user currently is in the dialogue.
///
/// - `Idle`: nothing pending
/// - `AwaitingClarification`: extraction asked questions, next text answers them
/// - `Previewing`: a preview with confirm/edit/cancel buttons is shown
/// - `AwaitingRefine`: the user chose "edit", next text is a correction
/// - `Expired`: the inactivity timer fired; buttons still work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationMode {
    #[default]
    Idle,
    AwaitingClarification,
    AwaitingRefine,
    Previewing,
    Expired,
}

impl ConversationMode {
    /// Modes in which the inactivity timer has something to expire.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Expired)
    }
}

impl StateMachine for ConversationMode {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConversationMode::*;
        matches!(
            (self, target),
            // Fresh input: questions, a preview, or a query answer
            (Idle, AwaitingClarification | Previewing | Idle) |
            // Clarification loop has no round limit
            (AwaitingClarification, AwaitingClarification | Previewing | Idle) |
            (Previewing, AwaitingRefine | Previewing | AwaitingClarification | Idle) |
            (AwaitingRefine, Previewing | AwaitingClarification | Idle) |
            // Inactivity
            (AwaitingClarification | AwaitingRefine | Previewing, Expired) |
            // Resume via button, or reset by fresh text
            (Expired, Previewing | AwaitingClarification | Idle)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConversationMode::*;
        match self {
            Idle => vec![AwaitingClarification, Previewing, Idle],
            AwaitingClarification => vec![AwaitingClarification, Previewing, Idle, Expired],
            Previewing => vec![AwaitingRefine, Previewing, AwaitingClarification, Idle, Expired],
            AwaitingRefine => vec![Previewing, AwaitingClarification, Idle, Expired],
            Expired => vec![Previewing, AwaitingClarification, Idle],
        }
    }
}

/// State owned per (chat, user) pair. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    key: SessionKey,
    mode: ConversationMode,
    pending_result: Option<ExtractionResult>,
    original_input: Option<String>,
    clarification_rounds: u32,
    expired_from: Option<ConversationMode>,
}

impl ConversationState {
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            mode: ConversationMode::Idle,
            pending_result: None,
            original_input: None,
            clarification_rounds: 0,
            expired_from: None,
        }
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn mode(&self) -> ConversationMode {
        self.mode
    }

    pub fn pending_result(&self) -> Option<&ExtractionResult> {
        self.pending_result.as_ref()
    }

    pub fn pending_result_mut(&mut self) -> Option<&mut ExtractionResult> {
        self.pending_result.as_mut()
    }

    pub fn original_input(&self) -> Option<&str> {
        self.original_input.as_deref()
    }

    pub fn clarification_rounds(&self) -> u32 {
        self.clarification_rounds
    }

    fn move_to(&mut self, target: ConversationMode) -> Result<(), ValidationError> {
        self.mode = self.mode.transition_to(target)?;
        Ok(())
    }

    /// Drops everything and returns to `Idle`.
    pub fn reset(&mut self) {
        self.mode = ConversationMode::Idle;
        self.pending_result = None;
        self.original_input = None;
        self.clarification_rounds = 0;
        self.expired_from = None;
    }

    /// Input text for the next extraction round.
    ///
    /// While clarifying, the answer is appended to the accumulated input;
    /// otherwise `text` starts a new one.
    pub fn input_for(&self, text: &str) -> String {
        match (&self.mode, &self.original_input) {
            (ConversationMode::AwaitingClarification, Some(original)) => {
                format!("{original}{ANSWERS_SEPARATOR}{text}")
            }
            _ => text.to_string(),
        }
    }

    /// Extraction asked questions; remember the input they refer to.
    pub fn await_clarification(
        &mut self,
        input: String,
        result: ExtractionResult,
    ) -> Result<(), ValidationError> {
        self.move_to(ConversationMode::AwaitingClarification)?;
        self.original_input = Some(input);
        self.pending_result = Some(result);
        self.clarification_rounds += 1;
        Ok(())
    }

    /// Shows a confirmable preview of `result`.
    pub fn preview(&mut self, input: String, result: ExtractionResult) -> Result<(), ValidationError> {
        self.move_to(ConversationMode::Previewing)?;
        self.original_input = Some(input);
        self.pending_result = Some(result);
        Ok(())
    }

    /// The user pressed "edit" on a preview.
    pub fn begin_refine(&mut self) -> Result<(), ValidationError> {
        if self.pending_result.is_none() {
            return Err(ValidationError::empty_field("pending_result"));
        }
        self.move_to(ConversationMode::AwaitingRefine)
    }

    /// Replaces the pending result after a refinement or manual edit.
    pub fn refined(&mut self, result: ExtractionResult) -> Result<(), ValidationError> {
        self.move_to(ConversationMode::Previewing)?;
        self.pending_result = Some(result);
        Ok(())
    }

    /// Inactivity timer fired. Returns false when there was nothing to expire.
    ///
    /// The pending result survives so a visible preview can still be confirmed.
    pub fn expire(&mut self) -> bool {
        if !self.mode.is_active() {
            return false;
        }
        self.expired_from = Some(self.mode);
        self.mode = ConversationMode::Expired;
        true
    }

    /// Plain text after expiry starts over.
    pub fn reset_if_expired(&mut self) -> bool {
        if self.mode == ConversationMode::Expired {
            self.reset();
            return true;
        }
        false
    }

    /// A button pressed after expiry picks up where the user left off.
    pub fn resume(&mut self) -> ConversationMode {
        if self.mode != ConversationMode::Expired {
            return self.mode;
        }
        // A pending refine is dropped: the preview buttons are what remain.
        self.mode = match self.expired_from.take() {
            Some(ConversationMode::AwaitingClarification) if self.original_input.is_some() => {
                ConversationMode::AwaitingClarification
            }
            _ if self.pending_result.is_some() => ConversationMode::Previewing,
            _ => ConversationMode::Idle,
        };
        self.mode
    }

    /// Takes the pending result for applying and resets the session.
    pub fn take_for_apply(&mut self) -> Option<(ExtractionResult, String)> {
        let result = self.pending_result.take()?;
        let input = self.original_input.take().unwrap_or_default();
        self.reset();
        Some((result, input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extraction::NewTask;
    use crate::domain::foundation::{ChatId, UserId};

    fn state() -> ConversationState {
        ConversationState::new(SessionKey::new(ChatId::new(1), UserId::new(2)))
    }

    fn with_task(title: &str) -> ExtractionResult {
        ExtractionResult {
            tasks_new: vec![NewTask::titled(title)],
            ..Default::default()
        }
    }

    fn asking(question: &str) -> ExtractionResult {
        ExtractionResult {
            clarifying_questions: vec![question.to_string()],
            ..Default::default()
        }
    }

    mod transitions {
        use super::*;

        #[test]
        fn idle_cannot_refine_or_expire() {
            assert!(!ConversationMode::Idle.can_transition_to(&ConversationMode::AwaitingRefine));
            assert!(!ConversationMode::Idle.can_transition_to(&ConversationMode::Expired));
        }

        #[test]
        fn every_active_mode_can_expire() {
            for mode in [
                ConversationMode::AwaitingClarification,
                ConversationMode::AwaitingRefine,
                ConversationMode::Previewing,
            ] {
                assert!(mode.can_transition_to(&ConversationMode::Expired), "{mode:?}");
            }
        }

        #[test]
        fn valid_transitions_agree_with_can_transition_to() {
            use ConversationMode::*;
            let all = [Idle, AwaitingClarification, AwaitingRefine, Previewing, Expired];
            for from in all {
                for to in all {
                    assert_eq!(
                        from.can_transition_to(&to),
                        from.valid_transitions().contains(&to),
                        "{from:?} -> {to:?}"
                    );
                }
            }
        }

        #[test]
        fn serializes_to_snake_case() {
            let json = serde_json::to_string(&ConversationMode::AwaitingRefine).unwrap();
            assert_eq!(json, "\"awaiting_refine\"");
        }
    }

    mod clarification {
        use super::*;

        #[test]
        fn answers_accumulate_onto_original_input() {
            let mut s = state();
            s.await_clarification("buy milk".into(), asking("Which shop?")).unwrap();
            let next = s.input_for("the corner one");
            assert_eq!(next, "buy milk\n\nUser answers:\nthe corner one");

            s.await_clarification(next.clone(), asking("When?")).unwrap();
            assert_eq!(s.clarification_rounds(), 2);
            assert_eq!(s.original_input(), Some(next.as_str()));
        }

        #[test]
        fn fresh_input_is_not_accumulated() {
            let s = state();
            assert_eq!(s.input_for("buy milk"), "buy milk");
        }

        #[test]
        fn clarification_ends_in_preview() {
            let mut s = state();
            s.await_clarification("buy milk".into(), asking("Which shop?")).unwrap();
            s.preview("buy milk...".into(), with_task("Buy milk")).unwrap();
            assert_eq!(s.mode(), ConversationMode::Previewing);
        }
    }

    mod refine {
        use super::*;

        #[test]
        fn edit_then_refined_returns_to_preview() {
            let mut s = state();
            s.preview("x".into(), with_task("A")).unwrap();
            s.begin_refine().unwrap();
            assert_eq!(s.mode(), ConversationMode::AwaitingRefine);
            s.refined(with_task("B")).unwrap();
            assert_eq!(s.mode(), ConversationMode::Previewing);
            assert_eq!(s.pending_result().unwrap().tasks_new[0].title, "B");
        }

        #[test]
        fn cannot_refine_from_idle() {
            let mut s = state();
            assert!(s.begin_refine().is_err());
            assert_eq!(s.mode(), ConversationMode::Idle);
        }
    }

    mod expiry {
        use super::*;

        #[test]
        fn expiry_keeps_pending_result() {
            let mut s = state();
            s.preview("x".into(), with_task("A")).unwrap();
            assert!(s.expire());
            assert_eq!(s.mode(), ConversationMode::Expired);
            assert!(s.pending_result().is_some());
        }

        #[test]
        fn idle_session_does_not_expire() {
            let mut s = state();
            assert!(!s.expire());
            assert_eq!(s.mode(), ConversationMode::Idle);
        }

        #[test]
        fn button_resumes_preview() {
            let mut s = state();
            s.preview("x".into(), with_task("A")).unwrap();
            s.begin_refine().unwrap();
            s.expire();
            assert_eq!(s.resume(), ConversationMode::Previewing);
            assert!(s.take_for_apply().is_some());
        }

        #[test]
        fn preview_after_clarification_resumes_as_preview() {
            let mut s = state();
            s.await_clarification("buy milk".into(), asking("Which shop?")).unwrap();
            s.preview("buy milk...".into(), with_task("Buy milk")).unwrap();
            s.expire();
            assert_eq!(s.resume(), ConversationMode::Previewing);
        }

        #[test]
        fn button_resumes_clarification() {
            let mut s = state();
            s.await_clarification("buy milk".into(), asking("Which project?")).unwrap();
            s.expire();
            assert_eq!(s.resume(), ConversationMode::AwaitingClarification);
            assert_eq!(s.input_for("Home"), "buy milk\n\nUser answers:\nHome");
        }

        #[test]
        fn text_after_expiry_resets() {
            let mut s = state();
            s.preview("x".into(), with_task("A")).unwrap();
            s.expire();
            assert!(s.reset_if_expired());
            assert_eq!(s, state());
        }
    }

    #[test]
    fn take_for_apply_resets_session() {
        let mut s = state();
        s.preview("buy milk".into(), with_task("Buy milk")).unwrap();
        let (result, input) = s.take_for_apply().unwrap();
        assert_eq!(result.tasks_new.len(), 1);
        assert_eq!(input, "buy milk");
        assert_eq!(s.mode(), ConversationMode::Idle);
    }
}
