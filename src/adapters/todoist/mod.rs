//! Todoist REST v2 implementation of the task store.

mod client;

pub use client::{TodoistConfig, TodoistStore, DEFAULT_API_BASE};
