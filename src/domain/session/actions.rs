//! Inline button payloads and keyboards.

use serde::{Deserialize, Serialize};

const PREVIEW_CONFIRM: &str = "preview:confirm";
const PREVIEW_EDIT: &str = "preview:edit";
const PREVIEW_CANCEL: &str = "preview:cancel";
const CLARIFY_PROJECT_PREFIX: &str = "clarify:project:";

/// A button press decoded from its callback data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    PreviewConfirm,
    PreviewEdit,
    PreviewCancel,
    /// `None` is the "skip" button.
    ClarifyProject(Option<String>),
}

impl CallbackAction {
    pub fn to_data(&self) -> String {
        match self {
            CallbackAction::PreviewConfirm => PREVIEW_CONFIRM.to_string(),
            CallbackAction::PreviewEdit => PREVIEW_EDIT.to_string(),
            CallbackAction::PreviewCancel => PREVIEW_CANCEL.to_string(),
            CallbackAction::ClarifyProject(name) => {
                format!("{CLARIFY_PROJECT_PREFIX}{}", name.as_deref().unwrap_or(""))
            }
        }
    }

    /// Decodes callback data; unknown payloads yield `None`.
    pub fn parse(data: &str) -> Option<Self> {
        match data.trim() {
            PREVIEW_CONFIRM => Some(CallbackAction::PreviewConfirm),
            PREVIEW_EDIT => Some(CallbackAction::PreviewEdit),
            PREVIEW_CANCEL => Some(CallbackAction::PreviewCancel),
            other => other.strip_prefix(CLARIFY_PROJECT_PREFIX).map(|name| {
                let name = name.trim();
                CallbackAction::ClarifyProject((!name.is_empty()).then(|| name.to_string()))
            }),
        }
    }

    /// Preview buttons act on a pending result; clarification buttons on the
    /// accumulated input.
    pub fn is_preview_action(&self) -> bool {
        !matches!(self, CallbackAction::ClarifyProject(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, action: &CallbackAction) -> Self {
        Self {
            label: label.into(),
            data: action.to_data(),
        }
    }
}

/// Rows of inline buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// Confirm on the first row, edit and cancel on the second.
    pub fn preview() -> Self {
        Keyboard::default()
            .row(vec![Button::new("Confirm", &CallbackAction::PreviewConfirm)])
            .row(vec![
                Button::new("Edit", &CallbackAction::PreviewEdit),
                Button::new("Cancel", &CallbackAction::PreviewCancel),
            ])
    }

    /// One row per project plus a trailing skip button.
    pub fn project_choice<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let keyboard = names.into_iter().fold(Keyboard::default(), |kb, name| {
            kb.row(vec![Button::new(
                name,
                &CallbackAction::ClarifyProject(Some(name.to_string())),
            )])
        });
        keyboard.row(vec![Button::new("Skip", &CallbackAction::ClarifyProject(None))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_actions_use_fixed_payloads() {
        assert_eq!(CallbackAction::PreviewConfirm.to_data(), "preview:confirm");
        assert_eq!(
            CallbackAction::parse("preview:cancel"),
            Some(CallbackAction::PreviewCancel)
        );
    }

    #[test]
    fn project_payload_carries_name() {
        assert_eq!(
            CallbackAction::parse("clarify:project:Home"),
            Some(CallbackAction::ClarifyProject(Some("Home".into())))
        );
    }

    #[test]
    fn empty_project_payload_means_skip() {
        assert_eq!(
            CallbackAction::parse("clarify:project:"),
            Some(CallbackAction::ClarifyProject(None))
        );
        assert_eq!(CallbackAction::ClarifyProject(None).to_data(), "clarify:project:");
    }

    #[test]
    fn unknown_payload_is_rejected() {
        assert_eq!(CallbackAction::parse("menu:open"), None);
    }

    #[test]
    fn project_keyboard_ends_with_skip() {
        let keyboard = Keyboard::project_choice(["Work", "Home"]);
        let data: Vec<&str> = keyboard.buttons().map(|b| b.data.as_str()).collect();
        assert_eq!(
            data,
            vec!["clarify:project:Work", "clarify:project:Home", "clarify:project:"]
        );
    }

    #[test]
    fn preview_keyboard_has_three_actions() {
        let actions: Vec<_> = Keyboard::preview()
            .buttons()
            .filter_map(|b| CallbackAction::parse(&b.data))
            .collect();
        assert_eq!(
            actions,
            vec![
                CallbackAction::PreviewConfirm,
                CallbackAction::PreviewEdit,
                CallbackAction::PreviewCancel
            ]
        );
    }
}
