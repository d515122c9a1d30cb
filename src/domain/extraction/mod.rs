//! Extraction module - structured operations produced from free-form input.
//!
//! An [`ExtractionResult`] is what the language model returns for a message:
//! new tasks, updates to existing tasks, reminders, clarifying questions and
//! metadata (including query intents). The types deserialize leniently since
//! model output is only loosely schema-conformant.

mod edit;
mod keywords;
mod query;
mod result;

pub use edit::{EditError, EditableField, FieldEdit, TaskFieldEdit};
pub use keywords::{Direction, Priority, RepeatRule, TaskStatus};
pub use query::{QueryFilters, QueryIntent, TaskQuery};
pub use result::{ExtractionResult, Meta, NewTask, Reminder, TaskChanges, TaskUpdate};
