//! Task Store Port - the remote task manager holding the real tasks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::extraction::TaskQuery;
use crate::domain::foundation::TaskId;
use crate::domain::resolver::TaskRecord;

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, StoreError>;

    /// Active tasks, optionally narrowed server-side.
    async fn get_tasks(&self, query: &TaskQuery) -> Result<Vec<TaskRecord>, StoreError>;

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<TaskRecord, StoreError>;

    async fn update_task(
        &self,
        id: &TaskId,
        request: &UpdateTaskRequest,
    ) -> Result<TaskRecord, StoreError>;

    async fn move_task(&self, id: &TaskId, project_id: &str) -> Result<TaskRecord, StoreError>;

    async fn close_task(&self, id: &TaskId) -> Result<(), StoreError>;

    async fn reopen_task(&self, id: &TaskId) -> Result<(), StoreError>;

    async fn create_reminder(&self, task_id: &TaskId, due: &ReminderDue) -> Result<(), StoreError>;
}

/// New task payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateTaskRequest {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// 1 (lowest) to 4 (highest).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// RFC 3339 with explicit offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_datetime: Option<String>,
}

impl CreateTaskRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Partial update; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_datetime: Option<String>,
}

impl UpdateTaskRequest {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderDue {
    pub datetime: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
}

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Non-2xx response.
    #[error("store returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("task store is not configured")]
    NotConfigured,
}

impl StoreError {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}
