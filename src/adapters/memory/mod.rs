//! In-memory adapters for tests and local runs.

mod chat;
mod task_store;

pub use chat::{RecordingChat, SentMessage};
pub use task_store::{InMemoryTaskStore, StoreCall};
