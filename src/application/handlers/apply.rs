//! ApplyEngine - applies a confirmed result against the task store.
//!
//! Creates, reminders and updates are independent per item: one failure is
//! reported on its own line and never aborts the rest.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::datetime::force_local;
use crate::domain::extraction::{ExtractionResult, NewTask, Reminder, TaskChanges, TaskStatus, TaskUpdate};
use crate::domain::foundation::TaskId;
use crate::domain::resolver::TaskRecord;
use crate::ports::{
    CreateTaskRequest, Oracle, OracleError, ReminderDue, StoreError, TaskStore, UpdateTaskRequest,
};

use super::entity_resolver::EntityResolver;

pub const DEFAULT_MAX_MATCHES: usize = 10;
const TASK_URL_BASE: &str = "https://app.todoist.com/app/task/";

/// Summary lines produced by one apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Creates and reminders.
    pub created: Vec<String>,
    pub updated: Vec<String>,
}

impl ApplyReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty()
    }
}

pub fn task_url(id: &TaskId) -> String {
    format!("{TASK_URL_BASE}{id}")
}

pub struct ApplyEngine {
    store: Arc<dyn TaskStore>,
    resolver: Arc<EntityResolver>,
    oracle: Arc<dyn Oracle>,
    max_matches: usize,
}

impl ApplyEngine {
    pub fn new(store: Arc<dyn TaskStore>, resolver: Arc<EntityResolver>, oracle: Arc<dyn Oracle>) -> Self {
        Self {
            store,
            resolver,
            oracle,
            max_matches: DEFAULT_MAX_MATCHES,
        }
    }

    /// Updates resolving to more tasks than this are skipped entirely.
    pub fn with_max_matches(mut self, max_matches: usize) -> Self {
        self.max_matches = max_matches;
        self
    }

    pub async fn apply(&self, result: &ExtractionResult, original: &str) -> ApplyReport {
        let mut report = ApplyReport::default();
        let local = force_local(original);

        let mut created_ids: Vec<TaskId> = Vec::new();
        for task in &result.tasks_new {
            match self.create(task, local).await {
                Ok(record) => {
                    report.created.push(format!(
                        "✅ Created: {} ({}) {}",
                        task.title,
                        record.id,
                        record.url.clone().unwrap_or_else(|| task_url(&record.id))
                    ));
                    self.resolver.record_created(record.id.clone()).await;
                    created_ids.push(record.id);
                }
                Err(e) => {
                    warn!(title = %task.title, error = %e, "Task create failed");
                    report.created.push(format!("❌ Failed to create: {}: {e}", task.title));
                }
            }
        }

        let first_created = created_ids.first().cloned();
        let mut placeholders = 0;
        for reminder in &result.reminders {
            if self
                .remind(reminder, first_created.as_ref(), original, local, &mut report.created)
                .await
            {
                placeholders += 1;
            }
        }

        if !created_ids.is_empty() || placeholders > 0 {
            self.resolver.refresh().await;
        }

        for update in &result.tasks_updates {
            self.update(update, original, local, &mut report.updated).await;
        }

        info!(
            created = created_ids.len(),
            summary_lines = report.created.len() + report.updated.len(),
            "Applied confirmed result"
        );
        report
    }

    async fn create(&self, task: &NewTask, local: bool) -> Result<TaskRecord, StoreError> {
        let normalizer = self.resolver.normalizer();
        let request = CreateTaskRequest {
            description: task.store_description(),
            // New tasks always land in the default project.
            project_id: None,
            labels: task.store_labels(),
            priority: task.priority.map(|p| p.store_level()),
            due_datetime: task
                .deadline
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(|d| normalizer.to_local_with_offset(d, local)),
            ..CreateTaskRequest::new(task.title.clone())
        };
        self.store.create_task(&request).await
    }

    /// Attaches one reminder. Returns true when a placeholder task was created.
    async fn remind(
        &self,
        reminder: &Reminder,
        first_created: Option<&TaskId>,
        original: &str,
        local: bool,
        lines: &mut Vec<String>,
    ) -> bool {
        let Some(at) = reminder.absolute_time() else {
            warn!(title = %reminder.title, offset = ?reminder.offset, "Reminder without absolute time skipped");
            lines.push(format!("⚠️ Reminder skipped (no absolute time): {}", reminder.title));
            return false;
        };

        let mut placeholder = false;
        let target = match first_created {
            Some(id) => id.clone(),
            None => match self.resolver.resolve(&reminder.title, Some(original)).await.first() {
                Some(existing) => {
                    lines.push(format!(
                        "💡 Reminder attached to existing task: {} ({})",
                        existing.content, existing.id
                    ));
                    existing.id.clone()
                }
                None => {
                    let title = format!("Reminder: {}", reminder.title);
                    match self.store.create_task(&CreateTaskRequest::new(title.clone())).await {
                        Ok(record) => {
                            lines.push(format!(
                                "✅ Created task for reminder: {title} ({}) {}",
                                record.id,
                                task_url(&record.id)
                            ));
                            placeholder = true;
                            record.id
                        }
                        Err(e) => {
                            lines.push(format!(
                                "❌ Failed to create a task for reminder {}: {e}",
                                reminder.title
                            ));
                            return false;
                        }
                    }
                }
            },
        };

        let normalizer = self.resolver.normalizer();
        let due = ReminderDue {
            datetime: normalizer.to_local_with_offset(at, local),
        };
        match self.store.create_reminder(&target, &due).await {
            Ok(()) => lines.push(format!(
                "⏰ Reminder set: {} at {}",
                reminder.title,
                normalizer.format_local_wall(Some(at), original)
            )),
            Err(e) => lines.push(format!("❌ Failed to set reminder {}: {e}", reminder.title)),
        }
        placeholder
    }

    async fn update(&self, update: &TaskUpdate, original: &str, local: bool, lines: &mut Vec<String>) {
        let targets = self.resolver.resolve(&update.target, Some(original)).await;
        if targets.is_empty() {
            lines.push(format!("⚠️ No tasks found for: {}", update.target));
            return;
        }
        if targets.len() > self.max_matches {
            warn!(
                target = %update.target,
                matches = targets.len(),
                cap = self.max_matches,
                "Update matched too many tasks"
            );
            lines.push(format!(
                "⚠️ Too many matches ({}) for: {}. Narrow your request.",
                targets.len(),
                update.target
            ));
            return;
        }

        for task in &targets {
            match self.apply_changes(task, &update.changes, local).await {
                Ok(()) => lines.push(format!(
                    "✅ Updated: {} ({}) {}",
                    task.content,
                    task.id,
                    task_url(&task.id)
                )),
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "Task update failed");
                    lines.push(format!("❌ Failed to update {} ({}): {e}", task.content, task.id));
                }
            }
        }
        self.resolver.refresh().await;
    }

    async fn apply_changes(
        &self,
        task: &TaskRecord,
        changes: &TaskChanges,
        local: bool,
    ) -> Result<(), StoreError> {
        let normalizer = self.resolver.normalizer();
        let description = changes.appended_description().map(|text| {
            let line = format!("UPD {}: {text}", normalizer.stamp(Utc::now()));
            let current = task.description.trim();
            if current.is_empty() {
                line
            } else {
                format!("{current}\n\n{line}")
            }
        });
        let request = UpdateTaskRequest {
            content: changes.new_title().map(String::from),
            description,
            labels: changes
                .touches_labels()
                .then(|| changes.merge_labels(&task.labels)),
            priority: changes.priority.map(|p| p.store_level()),
            due_datetime: changes
                .new_deadline()
                .map(|d| normalizer.to_local_with_offset(d, local)),
        };
        if !request.is_empty() {
            self.store.update_task(&task.id, &request).await?;
        }

        if let Some(project) = changes.target_project() {
            match self.resolver.projects().id_for(project) {
                Some(project_id) => {
                    self.store.move_task(&task.id, project_id).await?;
                }
                None => warn!(project, "Unknown project, move skipped"),
            }
        }

        match changes.status {
            Some(TaskStatus::Done) => self.store.close_task(&task.id).await?,
            Some(TaskStatus::Todo) => self.store.reopen_task(&task.id).await?,
            _ => {}
        }
        Ok(())
    }

    /// Rephrases summary lines; falls back to the lines verbatim.
    pub async fn personalize(&self, lines: &[String], context: &str) -> String {
        let base = lines.join("\n");
        match self.oracle.personalize(&base, context).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) | Err(OracleError::Disabled(_)) => base,
            Err(e) => {
                warn!(error = %e, "Personalization failed, sending plain summary");
                base
            }
        }
    }
}
