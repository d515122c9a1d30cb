//! Application layer - handlers that drive the domain through ports.
//!
//! The [`Assistant`] is the single entry point for inbound chat events; the
//! other handlers are the steps it composes.

pub mod handlers;

pub use handlers::{
    // Dispatcher
    Assistant, AssistantError, EventKind, InboundEvent, Sender,
    // Steps
    ApplyEngine, ApplyReport, EntityResolver, Extraction, ExtractionOrchestrator,
    PreviewRenderer, SessionManager,
};
