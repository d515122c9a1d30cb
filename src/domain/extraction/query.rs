//! Query intents: questions about existing tasks.
//!
//! A query intent carries filters in two groups. Time window, project and
//! first label become a server-side store query; priority and text filters
//! are applied locally to whatever the store returns.

use serde::Deserialize;

use super::keywords::Priority;
use crate::domain::foundation::lenient::null_as_default;
use crate::domain::projects::ProjectDirectory;
use crate::domain::resolver::TaskRecord;

const DEFAULT_QUESTION: &str = "Question about tasks";

/// Server-side task query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Store filter expression, e.g. `today & due on: 2025-01-02`.
    pub filter: Option<String>,
    pub project_id: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TimeFilter {
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub due_on: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NameFilter {
    #[serde(default, deserialize_with = "null_as_default")]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LabelFilter {
    #[serde(default, deserialize_with = "null_as_default")]
    pub include: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PriorityFilter {
    #[serde(rename = "in", default, deserialize_with = "null_as_default")]
    pub any_of: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TextFilter {
    #[serde(default, deserialize_with = "null_as_default")]
    pub contains: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QueryFilters {
    #[serde(default, deserialize_with = "null_as_default")]
    pub time: TimeFilter,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project: NameFilter,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: LabelFilter,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: PriorityFilter,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: TextFilter,
}

/// A parsed `{"type": "query", ...}` intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryIntent {
    pub question: String,
    pub filters: QueryFilters,
}

impl QueryIntent {
    /// Reads a raw intent object; returns `None` unless its type is `query`.
    ///
    /// Malformed filter objects degrade to "no filters" rather than dropping the intent.
    pub fn from_intent(intent: &serde_json::Value) -> Option<Self> {
        let kind = intent.get("type")?.as_str()?;
        if !kind.trim().eq_ignore_ascii_case("query") {
            return None;
        }
        let question = intent
            .get("question")
            .and_then(|q| q.as_str())
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_QUESTION)
            .to_string();
        let filters = intent
            .get("filters")
            .cloned()
            .and_then(|raw| match serde_json::from_value::<QueryFilters>(raw) {
                Ok(filters) => Some(filters),
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring malformed query filters");
                    None
                }
            })
            .unwrap_or_default();
        Some(Self { question, filters })
    }

    /// Builds the store query: time keywords and `due on:` joined with `&`,
    /// the first project mapped to its id, and the first included label.
    pub fn server_query(&self, projects: &ProjectDirectory) -> TaskQuery {
        let time = &self.filters.time;
        let mut parts: Vec<String> = Vec::new();

        let due = time.due.as_deref().unwrap_or("").trim().to_lowercase();
        match due.as_str() {
            "today" | "tomorrow" | "overdue" => parts.push(due.clone()),
            "this_week" => parts.push("today | overdue | 7 days".to_string()),
            "next_week" => parts.push("next 7 days".to_string()),
            _ => {}
        }
        if let Some(due_on) = time.due_on.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            parts.push(format!("due on: {due_on}"));
        }

        let project_id = self
            .filters
            .project
            .names
            .first()
            .and_then(|name| projects.id_for(name))
            .map(String::from);
        let label = self
            .filters
            .labels
            .include
            .first()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        TaskQuery {
            filter: (!parts.is_empty()).then(|| parts.join(" & ")),
            project_id,
            label,
        }
    }

    /// Applies the priority-set and text-contains filters.
    pub fn apply_local_filters(&self, records: Vec<TaskRecord>) -> Vec<TaskRecord> {
        let allowed: Vec<Priority> = self
            .filters
            .priority
            .any_of
            .iter()
            .filter_map(|p| Priority::parse(p))
            .collect();
        let needles: Vec<String> = self
            .filters
            .text
            .contains
            .iter()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();

        records
            .into_iter()
            .filter(|record| {
                allowed.is_empty()
                    || record
                        .priority
                        .and_then(Priority::from_store_level)
                        .is_some_and(|p| allowed.contains(&p))
            })
            .filter(|record| {
                if needles.is_empty() {
                    return true;
                }
                let hay = format!("{} {}", record.content, record.description).to_lowercase();
                needles.iter().all(|needle| hay.contains(needle.as_str()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TaskId;
    use serde_json::json;

    fn record(id: &str, content: &str, priority: u8) -> TaskRecord {
        TaskRecord {
            priority: Some(priority),
            ..TaskRecord::new(TaskId::new(id).unwrap(), content)
        }
    }

    #[test]
    fn non_query_intents_are_ignored() {
        assert!(QueryIntent::from_intent(&json!({"type": "create"})).is_none());
        assert!(QueryIntent::from_intent(&json!({"question": "what?"})).is_none());
    }

    #[test]
    fn missing_question_gets_default() {
        let intent = QueryIntent::from_intent(&json!({"type": "Query"})).unwrap();
        assert_eq!(intent.question, DEFAULT_QUESTION);
        assert_eq!(intent.filters, QueryFilters::default());
    }

    #[test]
    fn malformed_filters_degrade_to_none() {
        let intent =
            QueryIntent::from_intent(&json!({"type": "query", "filters": {"time": "today"}})).unwrap();
        assert_eq!(intent.filters, QueryFilters::default());
    }

    #[test]
    fn server_query_combines_time_project_and_label() {
        let projects = ProjectDirectory::parse("Work:100,Home:200");
        let intent = QueryIntent::from_intent(&json!({
            "type": "query",
            "question": "What is due this week at work?",
            "filters": {
                "time": {"due": "this_week", "due_on": "2025-01-03"},
                "project": {"names": ["Work", "Home"]},
                "labels": {"include": ["calls"]}
            }
        }))
        .unwrap();

        let query = intent.server_query(&projects);
        assert_eq!(
            query.filter.as_deref(),
            Some("today | overdue | 7 days & due on: 2025-01-03")
        );
        assert_eq!(query.project_id.as_deref(), Some("100"));
        assert_eq!(query.label.as_deref(), Some("calls"));
    }

    #[test]
    fn unknown_time_keyword_and_project_are_dropped() {
        let intent = QueryIntent::from_intent(&json!({
            "type": "query",
            "filters": {"time": {"due": "someday"}, "project": {"names": ["Garden"]}}
        }))
        .unwrap();
        assert_eq!(intent.server_query(&ProjectDirectory::default()), TaskQuery::default());
    }

    #[test]
    fn local_filters_match_priority_names_and_all_needles() {
        let intent = QueryIntent::from_intent(&json!({
            "type": "query",
            "filters": {"priority": {"in": ["high", "urgent"]}, "text": {"contains": ["report", "Q3"]}}
        }))
        .unwrap();
        let records = vec![
            record("1", "Q3 report draft", 4),
            record("2", "Q3 report review", 1),
            record("3", "Q4 report", 3),
        ];
        let kept: Vec<_> = intent
            .apply_local_filters(records)
            .into_iter()
            .map(|r| r.id.to_string())
            .collect();
        assert_eq!(kept, vec!["1"]);
    }
}
