//! PreviewRenderer - human-readable previews and clarification prompts.

use std::sync::Arc;

use crate::domain::datetime::DateTimeNormalizer;
use crate::domain::extraction::{ExtractionResult, TaskChanges, TaskUpdate};
use crate::domain::projects::ProjectDirectory;
use crate::domain::session::Keyboard;

use super::entity_resolver::EntityResolver;

const BLANK: &str = "—";
const MATCH_SAMPLE: usize = 3;

pub struct PreviewRenderer {
    normalizer: DateTimeNormalizer,
    projects: ProjectDirectory,
    /// Present when the store is configured; enables match counts.
    resolver: Option<Arc<EntityResolver>>,
}

impl PreviewRenderer {
    pub fn new(normalizer: DateTimeNormalizer, projects: ProjectDirectory) -> Self {
        Self {
            normalizer,
            projects,
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<EntityResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Renders the preview for `result`.
    ///
    /// A query-only result renders as its answer alone.
    pub async fn render(&self, result: &ExtractionResult, original: &str) -> String {
        if result.is_query_only() {
            return result.answer().unwrap_or_default().to_string();
        }

        let mut lines: Vec<String> = vec![
            "Original text:".into(),
            original.trim().to_string(),
            String::new(),
            "New tasks:".into(),
        ];

        if result.tasks_new.is_empty() {
            lines.push(format!("{BLANK} (no tasks found)"));
        }
        for (n, task) in result.tasks_new.iter().enumerate() {
            let labels = if task.labels.is_empty() {
                BLANK.to_string()
            } else {
                task.labels.join(", ")
            };
            lines.extend([
                format!("#{}: {}", n + 1, task.title),
                format!("  body: {}", or_blank(task.body.as_deref())),
                format!("  created_at: {}", or_blank(task.created_at.as_deref())),
                format!("  project: {}", or_blank(task.project.as_deref())),
                format!("  labels: {labels}"),
                format!("  priority: {}", or_blank(task.priority.map(|p| p.as_str()))),
                format!(
                    "  deadline: {}",
                    self.normalizer.format_local_wall(task.deadline.as_deref(), original)
                ),
                format!("  direction: {}", or_blank(task.direction.map(|d| d.as_str()))),
                String::new(),
            ]);
        }

        if !result.reminders.is_empty() {
            lines.push("Reminders (will be created):".into());
            for (n, reminder) in result.reminders.iter().enumerate() {
                let at = match reminder.absolute_time() {
                    Some(at) => self.normalizer.format_local_wall(Some(at), original),
                    None => BLANK.to_string(),
                };
                lines.push(format!(
                    "{}. {} (at: {at}, offset: {})",
                    n + 1,
                    reminder.title,
                    or_blank(reminder.offset.as_deref())
                ));
            }
            lines.push(String::new());
        }

        if !result.tasks_updates.is_empty() {
            lines.push("Planned updates:".into());
            for update in &result.tasks_updates {
                lines.push(self.update_line(update, original).await);
            }
        }

        if let Some(answer) = result.answer() {
            lines.push("Answer:".into());
            lines.push(answer.to_string());
        }

        lines.join("\n").trim().to_string()
    }

    async fn update_line(&self, update: &TaskUpdate, original: &str) -> String {
        let target = update.target.trim();
        let changes = self.describe_changes(&update.changes, original);
        let mut line = format!(
            "- target: {} | changes: {}",
            if target.is_empty() { "(to clarify)" } else { target },
            if changes.is_empty() {
                BLANK.to_string()
            } else {
                changes.join(", ")
            }
        );

        if let Some(resolver) = &self.resolver {
            let matches = resolver.resolve(target, Some(original)).await;
            if matches.is_empty() {
                line.push_str(" | matches: 0");
            } else {
                let sample: Vec<&str> = matches
                    .iter()
                    .take(MATCH_SAMPLE)
                    .map(|m| m.content.as_str())
                    .collect();
                let more = if matches.len() > MATCH_SAMPLE { "…" } else { "" };
                line.push_str(&format!(
                    " | matches: {} ({}{more})",
                    matches.len(),
                    sample.join(", ")
                ));
            }
        }
        line
    }

    fn describe_changes(&self, changes: &TaskChanges, original: &str) -> Vec<String> {
        let mut items = Vec::new();
        if let Some(title) = changes.new_title() {
            items.push(format!("title→{title}"));
        }
        if changes.appended_description().is_some() {
            items.push("append_description".into());
        }
        if let Some(priority) = changes.priority {
            items.push(format!("priority→{}", priority.as_str()));
        }
        if let Some(deadline) = changes.new_deadline() {
            items.push(format!(
                "deadline→{}",
                self.normalizer.format_local_wall(Some(deadline), original)
            ));
        }
        if !changes.labels_add.is_empty() {
            items.push(format!("labels+={}", changes.labels_add.join(",")));
        }
        if !changes.labels_remove.is_empty() {
            items.push(format!("labels-={}", changes.labels_remove.join(",")));
        }
        if let Some(status) = changes.status {
            items.push(format!("status→{}", status.as_str()));
        }
        if let Some(project) = changes.target_project() {
            items.push(format!("move→{project}"));
        }
        items
    }

    /// Numbered questions; questions about a project list the known projects.
    pub fn format_questions(&self, questions: &[&str]) -> String {
        let options: Vec<&str> = self.projects.names().collect();
        questions
            .iter()
            .enumerate()
            .map(|(n, question)| {
                let mut line = format!("{}. {question}", n + 1);
                if mentions_project(question) && !options.is_empty() {
                    line.push_str(&format!("\n   Options: {}", options.join(", ")));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Project buttons when any question asks about a project.
    pub fn question_keyboard(&self, questions: &[&str]) -> Option<Keyboard> {
        if self.projects.is_empty() || !questions.iter().any(|q| mentions_project(q)) {
            return None;
        }
        Some(Keyboard::project_choice(self.projects.names()))
    }
}

fn or_blank(value: Option<&str>) -> &str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(BLANK)
}

fn mentions_project(question: &str) -> bool {
    let lowered = question.to_lowercase();
    lowered.contains("project") || lowered.contains("проект")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryTaskStore;
    use crate::domain::extraction::{NewTask, Priority, Reminder, TaskStatus};
    use crate::domain::foundation::TaskId;
    use crate::domain::resolver::TaskRecord;

    fn renderer() -> PreviewRenderer {
        PreviewRenderer::new(
            DateTimeNormalizer::from_name("Europe/Moscow"),
            ProjectDirectory::parse("Work:77,Home"),
        )
    }

    #[tokio::test]
    async fn query_only_renders_answer_alone() {
        let result = ExtractionResult {
            query_answer: Some("You have two tasks today.".into()),
            ..Default::default()
        };
        assert_eq!(renderer().render(&result, "what today?").await, "You have two tasks today.");
    }

    #[tokio::test]
    async fn new_tasks_show_local_deadline() {
        let result = ExtractionResult {
            tasks_new: vec![NewTask {
                priority: Some(Priority::High),
                labels: vec!["work".into()],
                deadline: Some("2025-03-10T15:00:00Z".into()),
                ..NewTask::titled("Send invoice")
            }],
            ..Default::default()
        };
        let text = renderer().render(&result, "  send invoice at 18:00 ").await;

        assert!(text.starts_with("Original text:\nsend invoice at 18:00\n"));
        assert!(text.contains("#1: Send invoice"));
        assert!(text.contains("  priority: high"));
        assert!(text.contains("  labels: work"));
        assert!(text.contains("  deadline: 2025-03-10T18:00:00"));
        assert!(text.contains("  body: —"));
    }

    #[tokio::test]
    async fn empty_result_says_nothing_found() {
        let text = renderer().render(&ExtractionResult::default(), "hmm").await;
        assert!(text.contains("— (no tasks found)"));
        assert!(!text.contains("Answer:"));
    }

    #[tokio::test]
    async fn reminders_and_answer_are_listed() {
        let result = ExtractionResult {
            tasks_new: vec![NewTask::titled("Call mom")],
            reminders: vec![
                Reminder {
                    at: Some("2025-03-10T09:00:00".into()),
                    ..Reminder { title: "Call mom".into(), ..Default::default() }
                },
                Reminder {
                    offset: Some("PT15M".into()),
                    ..Reminder { title: "Stretch".into(), ..Default::default() }
                },
            ],
            query_answer: Some("Nothing else is due.".into()),
            ..Default::default()
        };
        let text = renderer().render(&result, "call mom").await;

        assert!(text.contains("1. Call mom (at: 2025-03-10T09:00:00, offset: —)"));
        assert!(text.contains("2. Stretch (at: —, offset: PT15M)"));
        assert!(text.ends_with("Answer:\nNothing else is due."));
    }

    #[tokio::test]
    async fn updates_show_changes_and_match_counts() {
        let store = InMemoryTaskStore::new()
            .with_task(TaskRecord::new(TaskId::new("1").unwrap(), "Report draft"))
            .with_task(TaskRecord::new(TaskId::new("2").unwrap(), "Report final"));
        let resolver = Arc::new(EntityResolver::new(
            Arc::new(store),
            ProjectDirectory::parse("Work:77"),
            DateTimeNormalizer::from_name("UTC"),
        ));
        let result = ExtractionResult {
            tasks_updates: vec![TaskUpdate {
                target: "report".into(),
                changes: TaskChanges {
                    status: Some(TaskStatus::Done),
                    labels_add: vec!["q1".into()],
                    project: Some("Work".into()),
                    ..Default::default()
                },
                ..Default::default()
            }],
            ..Default::default()
        };

        let text = renderer().with_resolver(resolver).render(&result, "close report").await;
        assert!(text.contains(
            "- target: report | changes: labels+=q1, status→done, move→Work | matches: 2 (Report draft, Report final)"
        ));
    }

    #[test]
    fn project_questions_get_options_and_keyboard() {
        let renderer = renderer();
        let questions = ["Which project should it go to?", "When is it due?"];

        assert_eq!(
            renderer.format_questions(&questions),
            "1. Which project should it go to?\n   Options: Work, Home\n2. When is it due?"
        );
        let keyboard = renderer.question_keyboard(&questions).unwrap();
        let data: Vec<&str> = keyboard.buttons().map(|b| b.data.as_str()).collect();
        assert_eq!(data, vec!["clarify:project:Work", "clarify:project:Home", "clarify:project:"]);

        assert!(renderer.question_keyboard(&["When is it due?"]).is_none());
    }
}
