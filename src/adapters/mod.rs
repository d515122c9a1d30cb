//! Adapters - Implementations of port interfaces.
//!
//! - `oracle` - Completion client and language-model oracle
//! - `todoist` - Task store over the Todoist REST API
//! - `transcriber` - External-command speech to text
//! - `console` - Stdout chat transport
//! - `memory` - In-memory store and chat used by tests

pub mod console;
pub mod memory;
pub mod oracle;
pub mod todoist;
pub mod transcriber;

pub use console::ConsoleChat;
pub use memory::{InMemoryTaskStore, RecordingChat, StoreCall};
pub use oracle::{LlmOracle, MockOracle, OpenRouterClient, OpenRouterConfig, ScriptedCompletionClient};
pub use todoist::{TodoistConfig, TodoistStore};
pub use transcriber::CommandTranscriber;
