//! Domain layer: pure types and algorithms, no I/O.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, errors, state machine trait)
//! - `projects` - Project name/id directory
//! - `datetime` - Home-timezone normalization of due values
//! - `extraction` - Structured result of understanding a user message
//! - `resolver` - Tiered matching of task references against store records
//! - `session` - Per-user conversation modes and button actions

pub mod datetime;
pub mod extraction;
pub mod foundation;
pub mod projects;
pub mod resolver;
pub mod session;
