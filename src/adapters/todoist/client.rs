//! HTTP client for the Todoist REST v2 API.
//!
//! Every request carries a bearer token and a fresh `X-Request-Id`. Non-2xx
//! responses are logged with their body and surface as `StoreError::Http`.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::extraction::TaskQuery;
use crate::domain::foundation::TaskId;
use crate::domain::resolver::TaskRecord;
use crate::ports::{
    CreateTaskRequest, ProjectRecord, ReminderDue, StoreError, TaskStore, UpdateTaskRequest,
};

pub const DEFAULT_API_BASE: &str = "https://api.todoist.com/rest/v2";

#[derive(Debug, Clone)]
pub struct TodoistConfig {
    token: Secret<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl TodoistConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Secret::new(token.into()),
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct TodoistStore {
    config: TodoistConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct MovePayload<'a> {
    project_id: &'a str,
}

#[derive(Debug, Serialize)]
struct ReminderPayload<'a> {
    item_id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    due: &'a ReminderDue,
}

impl TodoistStore {
    pub fn new(config: TodoistConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request_id = Uuid::new_v4();
        debug!(%method, path, %request_id, "Store request");
        self.client
            .request(method, self.url(path))
            .bearer_auth(self.config.token.expose_secret())
            .header("X-Request-Id", request_id.to_string())
    }

    async fn send(&self, operation: &'static str, builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::network(format!("{operation} timed out"))
            } else {
                StoreError::network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!(operation, status = status.as_u16(), body = %body, "Store request failed");
        Err(StoreError::http(status.as_u16(), body))
    }

    async fn json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        builder: RequestBuilder,
    ) -> Result<T, StoreError> {
        let response = self.send(operation, builder).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::parse(format!("{operation}: {e}")))
    }
}

fn query_params(query: &TaskQuery) -> Vec<(&'static str, &str)> {
    [
        ("filter", query.filter.as_deref()),
        ("project_id", query.project_id.as_deref()),
        ("label", query.label.as_deref()),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)))
    .collect()
}

#[async_trait]
impl TaskStore for TodoistStore {
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, StoreError> {
        let projects: Vec<ProjectRecord> = self
            .json("list_projects", self.request(Method::GET, "projects"))
            .await?;
        debug!(count = projects.len(), "Listed projects");
        Ok(projects)
    }

    async fn get_tasks(&self, query: &TaskQuery) -> Result<Vec<TaskRecord>, StoreError> {
        let builder = self
            .request(Method::GET, "tasks")
            .query(&query_params(query));
        let tasks: Vec<TaskRecord> = self.json("get_tasks", builder).await?;
        debug!(count = tasks.len(), "Fetched tasks");
        Ok(tasks)
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<TaskRecord, StoreError> {
        debug!(payload = ?request, "Creating task");
        let task: TaskRecord = self
            .json("create_task", self.request(Method::POST, "tasks").json(request))
            .await?;
        debug!(task_id = %task.id, "Created task");
        Ok(task)
    }

    async fn update_task(
        &self,
        id: &TaskId,
        request: &UpdateTaskRequest,
    ) -> Result<TaskRecord, StoreError> {
        debug!(task_id = %id, payload = ?request, "Updating task");
        let path = format!("tasks/{id}");
        self.json("update_task", self.request(Method::POST, &path).json(request))
            .await
    }

    async fn move_task(&self, id: &TaskId, project_id: &str) -> Result<TaskRecord, StoreError> {
        let path = format!("tasks/{id}");
        let payload = MovePayload { project_id };
        self.json("move_task", self.request(Method::POST, &path).json(&payload))
            .await
    }

    async fn close_task(&self, id: &TaskId) -> Result<(), StoreError> {
        let path = format!("tasks/{id}/close");
        self.send("close_task", self.request(Method::POST, &path)).await?;
        Ok(())
    }

    async fn reopen_task(&self, id: &TaskId) -> Result<(), StoreError> {
        let path = format!("tasks/{id}/reopen");
        self.send("reopen_task", self.request(Method::POST, &path)).await?;
        Ok(())
    }

    async fn create_reminder(&self, task_id: &TaskId, due: &ReminderDue) -> Result<(), StoreError> {
        let payload = ReminderPayload {
            item_id: task_id.as_str(),
            kind: "custom",
            due,
        };
        debug!(task_id = %task_id, due = %due.datetime, "Creating reminder");
        self.send("create_reminder", self.request(Method::POST, "reminders").json(&payload))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_skip_empty_values() {
        let query = TaskQuery {
            filter: Some("today".into()),
            project_id: Some(String::new()),
            label: None,
        };
        assert_eq!(query_params(&query), vec![("filter", "today")]);
    }

    #[test]
    fn reminder_payload_shape() {
        let due = ReminderDue {
            datetime: "2025-01-05T09:00:00+03:00".into(),
        };
        let payload = ReminderPayload {
            item_id: "42",
            kind: "custom",
            due: &due,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "item_id": "42",
                "type": "custom",
                "due": {"datetime": "2025-01-05T09:00:00+03:00"}
            })
        );
    }

    #[test]
    fn urls_join_base_and_path() {
        let store =
            TodoistStore::new(TodoistConfig::new("t").with_base_url("http://localhost:9/rest/v2/"))
                .unwrap();
        assert_eq!(store.url("tasks/1/close"), "http://localhost:9/rest/v2/tasks/1/close");
    }
}
