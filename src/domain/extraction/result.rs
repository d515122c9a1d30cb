//! Extraction result types.

use serde::{Deserialize, Serialize};

use super::keywords::{Direction, Priority, RepeatRule, TaskStatus};
use super::query::QueryIntent;
use crate::domain::foundation::lenient::{null_as_default, optional_keyword};

/// A task the user asked to create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Never sent to the store; new tasks land in the default project.
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "optional_keyword")]
    pub priority: Option<Priority>,
    /// ISO 8601, with or without an offset.
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default, deserialize_with = "optional_keyword")]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub source_text: Option<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Labels to store: user labels plus the direction, lowercased and deduplicated
    /// in first-seen order.
    pub fn store_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        let candidates = self
            .labels
            .iter()
            .map(|l| l.trim().to_lowercase())
            .chain(self.direction.map(|d| d.as_str().to_string()));
        for label in candidates {
            if !label.is_empty() && !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }

    /// Store description: the body followed by the quoted source text.
    pub fn store_description(&self) -> Option<String> {
        let parts: Vec<String> = [
            self.body.as_deref().map(str::trim).filter(|b| !b.is_empty()).map(String::from),
            self.source_text
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| format!("Source text: {s}")),
        ]
        .into_iter()
        .flatten()
        .collect();
        (!parts.is_empty()).then(|| parts.join("\n\n"))
    }
}

/// Field changes requested for an existing task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskChanges {
    #[serde(default, deserialize_with = "optional_keyword")]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub title: Option<String>,
    /// Text to append to the description, not a replacement.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "optional_keyword")]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels_add: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels_remove: Vec<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    /// Project name to move the task into.
    #[serde(default)]
    pub project: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl TaskChanges {
    pub fn new_title(&self) -> Option<&str> {
        present(&self.title)
    }

    pub fn appended_description(&self) -> Option<&str> {
        present(&self.description)
    }

    pub fn new_deadline(&self) -> Option<&str> {
        present(&self.deadline)
    }

    pub fn target_project(&self) -> Option<&str> {
        present(&self.project)
    }

    pub fn touches_labels(&self) -> bool {
        !self.labels_add.is_empty() || !self.labels_remove.is_empty()
    }

    /// Applies additions then removals to `current`, lowercasing added labels
    /// and keeping first-seen order without duplicates.
    pub fn merge_labels(&self, current: &[String]) -> Vec<String> {
        let removed: Vec<String> = self
            .labels_remove
            .iter()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect();
        let added = self
            .labels_add
            .iter()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty());

        let mut merged: Vec<String> = Vec::new();
        for label in current.iter().cloned().chain(added) {
            if removed.contains(&label.to_lowercase()) || merged.contains(&label) {
                continue;
            }
            merged.push(label);
        }
        merged
    }
}

/// A change to one or more existing tasks identified by `target`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    /// Free text, numeric id, task URL, or "last".
    #[serde(default, deserialize_with = "null_as_default")]
    pub target: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub changes: TaskChanges,
    #[serde(default)]
    pub source_text: Option<String>,
}

/// A reminder; `at` is an absolute time, `offset` an ISO 8601 duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub title: String,
    #[serde(default)]
    pub at: Option<String>,
    #[serde(default)]
    pub offset: Option<String>,
    #[serde(default, deserialize_with = "optional_keyword")]
    pub repeat: Option<RepeatRule>,
    #[serde(default)]
    pub source_text: Option<String>,
}

impl Reminder {
    pub fn absolute_time(&self) -> Option<&str> {
        present(&self.at)
    }
}

/// Extraction metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub parsed_at: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Free-form intent objects; `{"type": "query", ...}` marks a question about tasks.
    #[serde(default, deserialize_with = "null_as_default")]
    pub intents: Vec<serde_json::Value>,
}

/// Everything extracted from one (possibly accumulated) user input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks_new: Vec<NewTask>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks_updates: Vec<TaskUpdate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reminders: Vec<Reminder>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clarifying_questions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: Meta,
    /// Answer to a query intent, computed after extraction.
    #[serde(skip)]
    pub query_answer: Option<String>,
}

impl ExtractionResult {
    /// True when there is at least one create, update, or reminder to apply.
    pub fn has_actions(&self) -> bool {
        !self.tasks_new.is_empty() || !self.tasks_updates.is_empty() || !self.reminders.is_empty()
    }

    pub fn answer(&self) -> Option<&str> {
        present(&self.query_answer)
    }

    /// A query-only result is terminal: it is answered and never confirmed.
    pub fn is_query_only(&self) -> bool {
        !self.has_actions() && self.answer().is_some()
    }

    /// Non-blank clarifying questions.
    pub fn open_questions(&self) -> Vec<&str> {
        self.clarifying_questions
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .collect()
    }

    pub fn needs_clarification(&self) -> bool {
        !self.open_questions().is_empty()
    }

    /// First intent whose `type` is `query`, if any.
    pub fn query_intent(&self) -> Option<QueryIntent> {
        self.meta.intents.iter().find_map(QueryIntent::from_intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_model_output() {
        let result: ExtractionResult =
            serde_json::from_str(r#"{"tasks_new":[{"title":"Buy milk"}]}"#).unwrap();
        assert_eq!(result.tasks_new.len(), 1);
        assert!(result.tasks_updates.is_empty());
        assert!(result.meta.intents.is_empty());
    }

    #[test]
    fn tolerates_nulls_and_unknown_keywords() {
        let json = r#"{
            "tasks_new": [{"title": "Call Bob", "labels": null, "priority": "whenever", "direction": "to_me"}],
            "tasks_updates": null,
            "reminders": [{"title": "Call", "at": "2025-01-01T10:00:00", "repeat": "none"}],
            "clarifying_questions": null,
            "meta": null
        }"#;
        let result: ExtractionResult = serde_json::from_str(json).unwrap();
        let task = &result.tasks_new[0];
        assert!(task.labels.is_empty());
        assert_eq!(task.priority, None);
        assert_eq!(task.direction, Some(Direction::ToMe));
        assert_eq!(result.reminders[0].repeat, Some(RepeatRule::Once));
    }

    #[test]
    fn missing_title_is_rejected() {
        assert!(serde_json::from_str::<ExtractionResult>(r#"{"tasks_new":[{"body":"x"}]}"#).is_err());
    }

    #[test]
    fn query_answer_is_not_serialized() {
        let result = ExtractionResult {
            query_answer: Some("Three tasks".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("Three tasks"));
    }

    #[test]
    fn store_labels_include_direction_once() {
        let task = NewTask {
            labels: vec!["Work".into(), "work".into(), " ".into(), "from_me".into()],
            direction: Some(Direction::FromMe),
            ..NewTask::titled("x")
        };
        assert_eq!(task.store_labels(), vec!["work", "from_me"]);
    }

    #[test]
    fn store_description_joins_body_and_source() {
        let task = NewTask {
            body: Some("Details".into()),
            source_text: Some("buy milk tomorrow".into()),
            ..NewTask::titled("Buy milk")
        };
        assert_eq!(
            task.store_description().as_deref(),
            Some("Details\n\nSource text: buy milk tomorrow")
        );
        assert_eq!(NewTask::titled("x").store_description(), None);
    }

    #[test]
    fn merge_labels_adds_then_removes() {
        let changes = TaskChanges {
            labels_add: vec!["Urgent".into(), "home".into()],
            labels_remove: vec!["OLD".into()],
            ..Default::default()
        };
        let merged = changes.merge_labels(&["old".into(), "home".into()]);
        assert_eq!(merged, vec!["home", "urgent"]);
    }

    #[test]
    fn query_only_requires_no_actions_and_an_answer() {
        let mut result = ExtractionResult {
            query_answer: Some("You have 2 tasks today".into()),
            ..Default::default()
        };
        assert!(result.is_query_only());

        result.tasks_new.push(NewTask::titled("x"));
        assert!(!result.is_query_only());

        let blank = ExtractionResult {
            query_answer: Some("  ".into()),
            ..Default::default()
        };
        assert!(!blank.is_query_only());
    }

    #[test]
    fn blank_questions_do_not_need_clarification() {
        let result = ExtractionResult {
            clarifying_questions: vec!["".into(), "  ".into()],
            ..Default::default()
        };
        assert!(!result.needs_clarification());
    }
}
