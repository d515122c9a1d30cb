//! Store task records as seen by the resolver.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::lenient::null_as_default;
use crate::domain::foundation::TaskId;
use crate::domain::projects::ProjectDirectory;

/// Due information attached to a store task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDue {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub datetime: Option<String>,
    /// Human phrasing, e.g. "every monday".
    #[serde(default)]
    pub string: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// An active task held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    /// Store level, 1 (lowest) to 4 (highest).
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub due: Option<TaskDue>,
    #[serde(default)]
    pub url: Option<String>,
}

impl TaskRecord {
    pub fn new(id: TaskId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            description: String::new(),
            labels: Vec::new(),
            project_id: None,
            priority: None,
            due: None,
            url: None,
        }
    }

    /// The datetime if present, otherwise the date.
    pub fn due_value(&self) -> Option<&str> {
        let due = self.due.as_ref()?;
        due.datetime
            .as_deref()
            .or(due.date.as_deref())
            .filter(|v| !v.trim().is_empty())
    }

    /// Searchable text: content, description, labels, project name, priority
    /// and due value joined with ` | `, lowercased.
    pub fn haystack(&self, projects: &ProjectDirectory) -> String {
        let project = self
            .project_id
            .as_deref()
            .and_then(|id| projects.name_for(id))
            .unwrap_or("");
        let priority = self.priority.map(|p| p.to_string()).unwrap_or_default();
        [
            self.content.as_str(),
            self.description.as_str(),
            &self.labels.join(", "),
            project,
            &priority,
            self.due_value().unwrap_or(""),
        ]
        .join(" | ")
        .to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_store_payload() {
        let json = r#"{
            "id": "7025",
            "content": "Pay rent",
            "description": null,
            "labels": ["home"],
            "project_id": "200",
            "priority": 3,
            "due": {"date": "2025-01-05", "datetime": "2025-01-05T09:00:00Z", "string": "jan 5 9am"},
            "url": "https://app.todoist.com/app/task/7025",
            "comment_count": 0
        }"#;
        let record: TaskRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id.as_str(), "7025");
        assert_eq!(record.description, "");
        assert_eq!(record.due_value(), Some("2025-01-05T09:00:00Z"));
    }

    #[test]
    fn due_value_falls_back_to_date() {
        let record = TaskRecord {
            due: Some(TaskDue {
                date: Some("2025-01-05".into()),
                ..Default::default()
            }),
            ..TaskRecord::new(TaskId::new("1").unwrap(), "x")
        };
        assert_eq!(record.due_value(), Some("2025-01-05"));
    }

    #[test]
    fn haystack_includes_project_name_and_priority() {
        let projects = ProjectDirectory::parse("Home:200");
        let record = TaskRecord {
            description: "Landlord".into(),
            labels: vec!["Bills".into(), "home".into()],
            project_id: Some("200".into()),
            priority: Some(3),
            ..TaskRecord::new(TaskId::new("1").unwrap(), "Pay Rent")
        };
        assert_eq!(
            record.haystack(&projects),
            "pay rent | landlord | bills, home | home | 3 | "
        );
    }
}
