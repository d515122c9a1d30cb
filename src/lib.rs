//! Tasktalk - Conversational Task Assistant
//!
//! Turns free-form text or voice messages into a structured set of task
//! operations, walks the user through clarification and a confirmable preview,
//! and applies the confirmed operations against a remote task store.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
