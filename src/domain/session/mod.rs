//! Per-user conversation state and the actions a user can take on it.

mod actions;
mod state;

pub use actions::{Button, CallbackAction, Keyboard};
pub use state::{ConversationMode, ConversationState};
