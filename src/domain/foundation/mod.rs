//! Foundation module - Shared domain primitives.
//!
//! Identifiers, the state machine trait, and validation errors used by the
//! rest of the domain.

mod errors;
mod ids;
mod state_machine;

pub(crate) mod lenient;

pub use errors::ValidationError;
pub use ids::{ChatId, SessionKey, TaskId, UserId};
pub use state_machine::StateMachine;
