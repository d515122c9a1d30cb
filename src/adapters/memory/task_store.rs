//! In-memory task store.
//!
//! Holds active and closed tasks, logs every call, and can be told to fail
//! creates for specific titles or any call touching specific task ids.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::extraction::TaskQuery;
use crate::domain::foundation::TaskId;
use crate::domain::resolver::{TaskDue, TaskRecord};
use crate::ports::{
    CreateTaskRequest, ProjectRecord, ReminderDue, StoreError, TaskStore, UpdateTaskRequest,
};

const FIRST_ID: u64 = 1000;

/// A recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListProjects,
    GetTasks(TaskQuery),
    Create(CreateTaskRequest),
    Update(TaskId, UpdateTaskRequest),
    Move(TaskId, String),
    Close(TaskId),
    Reopen(TaskId),
    Reminder(TaskId, ReminderDue),
}

#[derive(Debug, Default)]
struct State {
    active: Vec<TaskRecord>,
    closed: Vec<TaskRecord>,
    projects: Vec<ProjectRecord>,
    next_id: u64,
    calls: Vec<StoreCall>,
    failing_titles: HashSet<String>,
    failing_ids: HashSet<TaskId>,
}

#[derive(Debug, Clone)]
pub struct InMemoryTaskStore {
    state: Arc<Mutex<State>>,
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                next_id: FIRST_ID,
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::network("in-memory store lock poisoned"))
    }

    fn with_state(self, f: impl FnOnce(&mut State)) -> Self {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
        self
    }

    pub fn with_task(self, task: TaskRecord) -> Self {
        self.with_state(|s| s.active.push(task))
    }

    pub fn with_project(self, id: &str, name: &str) -> Self {
        let project = ProjectRecord {
            id: id.to_string(),
            name: name.to_string(),
        };
        self.with_state(|s| s.projects.push(project))
    }

    /// Creates with this content fail with a 500.
    pub fn failing_create(self, title: &str) -> Self {
        let title = title.to_string();
        self.with_state(|s| {
            s.failing_titles.insert(title);
        })
    }

    /// Any call on this id fails with a 500.
    pub fn failing_task(self, id: &TaskId) -> Self {
        let id = id.clone();
        self.with_state(|s| {
            s.failing_ids.insert(id);
        })
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    pub fn active_tasks(&self) -> Vec<TaskRecord> {
        self.state.lock().map(|s| s.active.clone()).unwrap_or_default()
    }

    pub fn closed_tasks(&self) -> Vec<TaskRecord> {
        self.state.lock().map(|s| s.closed.clone()).unwrap_or_default()
    }

    /// Number of recorded calls that mutate tasks.
    pub fn mutation_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| !matches!(c, StoreCall::ListProjects | StoreCall::GetTasks(_)))
            .count()
    }
}

fn injected(what: &str) -> StoreError {
    StoreError::http(500, format!("injected failure: {what}"))
}

impl State {
    fn check(&self, id: &TaskId) -> Result<(), StoreError> {
        if self.failing_ids.contains(id) {
            return Err(injected(id.as_str()));
        }
        Ok(())
    }

    fn active_mut(&mut self, id: &TaskId) -> Result<&mut TaskRecord, StoreError> {
        self.active
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| StoreError::http(404, format!("task {id} not found")))
    }
}

fn due_at(datetime: &Option<String>) -> Option<TaskDue> {
    datetime.as_ref().map(|dt| TaskDue {
        datetime: Some(dt.clone()),
        ..Default::default()
    })
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, StoreError> {
        let mut state = self.lock()?;
        state.calls.push(StoreCall::ListProjects);
        Ok(state.projects.clone())
    }

    async fn get_tasks(&self, query: &TaskQuery) -> Result<Vec<TaskRecord>, StoreError> {
        let mut state = self.lock()?;
        state.calls.push(StoreCall::GetTasks(query.clone()));
        // Filter expressions are not evaluated.
        Ok(state
            .active
            .iter()
            .filter(|t| query.project_id.is_none() || t.project_id == query.project_id)
            .filter(|t| query.label.as_ref().map_or(true, |l| t.labels.contains(l)))
            .cloned()
            .collect())
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<TaskRecord, StoreError> {
        let mut state = self.lock()?;
        state.calls.push(StoreCall::Create(request.clone()));
        if state.failing_titles.contains(&request.content) {
            return Err(injected(&request.content));
        }

        let id = TaskId::new(state.next_id.to_string())
            .map_err(|e| StoreError::parse(e.to_string()))?;
        state.next_id += 1;
        let task = TaskRecord {
            description: request.description.clone().unwrap_or_default(),
            labels: request.labels.clone(),
            project_id: request.project_id.clone(),
            priority: request.priority,
            due: due_at(&request.due_datetime),
            url: Some(format!("https://app.todoist.com/app/task/{id}")),
            ..TaskRecord::new(id, request.content.clone())
        };
        state.active.push(task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        id: &TaskId,
        request: &UpdateTaskRequest,
    ) -> Result<TaskRecord, StoreError> {
        let mut state = self.lock()?;
        state.calls.push(StoreCall::Update(id.clone(), request.clone()));
        state.check(id)?;

        let task = state.active_mut(id)?;
        if let Some(content) = &request.content {
            task.content = content.clone();
        }
        if let Some(description) = &request.description {
            task.description = description.clone();
        }
        if let Some(labels) = &request.labels {
            task.labels = labels.clone();
        }
        if request.priority.is_some() {
            task.priority = request.priority;
        }
        if request.due_datetime.is_some() {
            task.due = due_at(&request.due_datetime);
        }
        Ok(task.clone())
    }

    async fn move_task(&self, id: &TaskId, project_id: &str) -> Result<TaskRecord, StoreError> {
        let mut state = self.lock()?;
        state.calls.push(StoreCall::Move(id.clone(), project_id.to_string()));
        state.check(id)?;

        let task = state.active_mut(id)?;
        task.project_id = Some(project_id.to_string());
        Ok(task.clone())
    }

    async fn close_task(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.calls.push(StoreCall::Close(id.clone()));
        state.check(id)?;

        let position = state
            .active
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| StoreError::http(404, format!("task {id} not found")))?;
        let task = state.active.remove(position);
        state.closed.push(task);
        Ok(())
    }

    async fn reopen_task(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.calls.push(StoreCall::Reopen(id.clone()));
        state.check(id)?;

        // Reopening an active task is a no-op, as in the real API.
        if let Some(position) = state.closed.iter().position(|t| &t.id == id) {
            let task = state.closed.remove(position);
            state.active.push(task);
        }
        Ok(())
    }

    async fn create_reminder(&self, task_id: &TaskId, due: &ReminderDue) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state
            .calls
            .push(StoreCall::Reminder(task_id.clone(), due.clone()));
        state.check(task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TaskId {
        TaskId::new(s).unwrap()
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let store = InMemoryTaskStore::new();
        let a = store.create_task(&CreateTaskRequest::new("A")).await.unwrap();
        let b = store.create_task(&CreateTaskRequest::new("B")).await.unwrap();
        assert_eq!(a.id.as_str(), "1000");
        assert_eq!(b.id.as_str(), "1001");
        assert_eq!(store.active_tasks().len(), 2);
    }

    #[tokio::test]
    async fn failing_title_is_rejected_and_logged() {
        let store = InMemoryTaskStore::new().failing_create("Broken");
        let err = store
            .create_task(&CreateTaskRequest::new("Broken"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Http { status: 500, .. }));
        assert_eq!(store.calls().len(), 1);
        assert!(store.active_tasks().is_empty());
    }

    #[tokio::test]
    async fn close_and_reopen_move_between_lists() {
        let store = InMemoryTaskStore::new().with_task(TaskRecord::new(id("7"), "Pay rent"));
        store.close_task(&id("7")).await.unwrap();
        assert!(store.active_tasks().is_empty());
        store.reopen_task(&id("7")).await.unwrap();
        assert_eq!(store.active_tasks().len(), 1);
        assert!(store.closed_tasks().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_only_given_fields() {
        let store = InMemoryTaskStore::new().with_task(TaskRecord {
            description: "old".into(),
            ..TaskRecord::new(id("7"), "Pay rent")
        });
        let updated = store
            .update_task(
                &id("7"),
                &UpdateTaskRequest {
                    priority: Some(4),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.priority, Some(4));
        assert_eq!(updated.description, "old");
    }

    #[tokio::test]
    async fn get_tasks_filters_by_label() {
        let store = InMemoryTaskStore::new()
            .with_task(TaskRecord {
                labels: vec!["home".into()],
                ..TaskRecord::new(id("1"), "A")
            })
            .with_task(TaskRecord::new(id("2"), "B"));
        let query = TaskQuery {
            label: Some("home".into()),
            ..Default::default()
        };
        let found = store.get_tasks(&query).await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
