//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `CompletionClient` - Chat-completion transport
//! - `Oracle` - Language-model operations (extract, refine, validate, answer)
//! - `TaskStore` - Remote task manager
//! - `Transcriber` - Speech to text
//! - `ChatSender` - Replies to the user

mod chat;
mod completion;
mod oracle;
mod task_store;
mod transcriber;

pub use chat::{ChatError, ChatSender, OutboundMessage};
pub use completion::{
    AIError, CompletionClient, CompletionRequest, CompletionResponse, Message, MessageRole,
    ProviderInfo,
};
pub use oracle::{Oracle, OracleError, FALLBACK_REFUSAL};
pub use task_store::{
    CreateTaskRequest, ProjectRecord, ReminderDue, StoreError, TaskStore, UpdateTaskRequest,
};
pub use transcriber::{Transcriber, TranscriptionError};
