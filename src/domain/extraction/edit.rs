//! Manual structured edits of a pending result.
//!
//! While a preview is being refined the user may send
//!
//! ```text
//! task: 2
//! field: priority
//! value: high
//! ```
//!
//! (or the Russian `задача` / `поле` / `значение`). Such a message is applied
//! locally without a model round trip. Field names form a closed set and an
//! unknown name is an error, not a silent no-op.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::keywords::{Direction, Priority};
use super::result::ExtractionResult;

/// Errors for structured edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("unknown field '{0}'; editable fields: title, body, created_at, project, priority, deadline, direction, labels")]
    UnknownField(String),

    #[error("task number '{0}' is not a positive integer")]
    InvalidIndex(String),

    #[error("task #{index} does not exist (there are {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("invalid value '{value}' for {field}")]
    InvalidValue { field: EditableField, value: String },
}

/// Fields of a new task that can be edited by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditableField {
    Title,
    Body,
    CreatedAt,
    Project,
    Priority,
    Deadline,
    Direction,
    Labels,
}

impl EditableField {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditableField::Title => "title",
            EditableField::Body => "body",
            EditableField::CreatedAt => "created_at",
            EditableField::Project => "project",
            EditableField::Priority => "priority",
            EditableField::Deadline => "deadline",
            EditableField::Direction => "direction",
            EditableField::Labels => "labels",
        }
    }
}

impl fmt::Display for EditableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditableField {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(EditableField::Title),
            "body" => Ok(EditableField::Body),
            "created_at" => Ok(EditableField::CreatedAt),
            "project" => Ok(EditableField::Project),
            "priority" => Ok(EditableField::Priority),
            "deadline" => Ok(EditableField::Deadline),
            "direction" => Ok(EditableField::Direction),
            "labels" => Ok(EditableField::Labels),
            other => Err(EditError::UnknownField(other.to_string())),
        }
    }
}

/// A typed field value. `None` clears an optional field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Title(String),
    Body(Option<String>),
    CreatedAt(Option<String>),
    Project(Option<String>),
    Priority(Option<Priority>),
    Deadline(Option<String>),
    Direction(Option<Direction>),
    Labels(Vec<String>),
}

impl FieldEdit {
    /// Parses `value` for `field`. An empty value clears optional fields.
    pub fn parse(field: EditableField, value: &str) -> Result<Self, EditError> {
        let value = value.trim();
        let text = (!value.is_empty()).then(|| value.to_string());
        let invalid = || EditError::InvalidValue {
            field,
            value: value.to_string(),
        };
        Ok(match field {
            EditableField::Title => FieldEdit::Title(text.ok_or_else(invalid)?),
            EditableField::Body => FieldEdit::Body(text),
            EditableField::CreatedAt => FieldEdit::CreatedAt(text),
            EditableField::Project => FieldEdit::Project(text),
            EditableField::Deadline => FieldEdit::Deadline(text),
            EditableField::Priority => match text {
                None => FieldEdit::Priority(None),
                Some(raw) => FieldEdit::Priority(Some(Priority::parse(&raw).ok_or_else(invalid)?)),
            },
            EditableField::Direction => match text {
                None => FieldEdit::Direction(None),
                Some(raw) => {
                    FieldEdit::Direction(Some(Direction::parse(&raw).ok_or_else(invalid)?))
                }
            },
            EditableField::Labels => FieldEdit::Labels(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect(),
            ),
        })
    }
}

/// One edit addressed to a 1-based new-task number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFieldEdit {
    pub task_number: usize,
    pub edit: FieldEdit,
}

fn line_value<'a>(text: &'a str, keys: &[&str]) -> Option<&'a str> {
    text.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        let key = key.trim().to_lowercase();
        keys.contains(&key.as_str()).then_some(value.trim())
    })
}

impl TaskFieldEdit {
    /// Recognizes the structured form.
    ///
    /// Returns `Ok(None)` unless both a task line and a field line are
    /// present (anything else is a free-form correction), and an error when
    /// the form is present but wrong.
    pub fn parse(text: &str) -> Result<Option<Self>, EditError> {
        let (Some(raw_index), Some(field)) = (
            line_value(text, &["task", "задача"]),
            line_value(text, &["field", "поле"]),
        ) else {
            return Ok(None);
        };
        let value = line_value(text, &["value", "значение"]).unwrap_or("");

        let task_number = raw_index
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| EditError::InvalidIndex(raw_index.to_string()))?;
        let field: EditableField = field.parse()?;
        let edit = FieldEdit::parse(field, value)?;
        Ok(Some(Self { task_number, edit }))
    }

    /// Applies the edit to the addressed new task.
    pub fn apply(&self, result: &mut ExtractionResult) -> Result<(), EditError> {
        let count = result.tasks_new.len();
        let task = self
            .task_number
            .checked_sub(1)
            .and_then(|i| result.tasks_new.get_mut(i))
            .ok_or(EditError::IndexOutOfRange {
                index: self.task_number,
                count,
            })?;
        match self.edit.clone() {
            FieldEdit::Title(title) => task.title = title,
            FieldEdit::Body(body) => task.body = body,
            FieldEdit::CreatedAt(at) => task.created_at = at,
            FieldEdit::Project(project) => task.project = project,
            FieldEdit::Priority(priority) => task.priority = priority,
            FieldEdit::Deadline(deadline) => task.deadline = deadline,
            FieldEdit::Direction(direction) => task.direction = direction,
            FieldEdit::Labels(labels) => task.labels = labels,
        }
        Ok(())
    }
}
