//! Application handlers.

pub mod apply;
pub mod assistant;
pub mod entity_resolver;
pub mod orchestrator;
pub mod preview;
pub mod session_manager;

pub use apply::{task_url, ApplyEngine, ApplyReport, DEFAULT_MAX_MATCHES};
pub use assistant::{Assistant, AssistantError, EventKind, InboundEvent, Sender};
pub use entity_resolver::{EntityResolver, DEFAULT_CACHE_TTL, DEFAULT_MIN_SCORE};
pub use orchestrator::{Extraction, ExtractionOrchestrator};
pub use preview::PreviewRenderer;
pub use session_manager::{SessionManager, DEFAULT_SESSION_TIMEOUT};
