//! Entity resolution - mapping a free-text reference to store records.
//!
//! Resolution is tiered and stops at the first tier that applies:
//! an id or task URL, then "last", then substring search with an optional
//! relative-day filter, then fuzzy scoring.

mod cache;
mod engine;
mod fuzzy;
mod recent;
mod record;
mod target;

pub use cache::ActiveTaskCache;
pub use engine::{resolve, resolve_with_tier, ResolveContext, ResolveTier};
pub use fuzzy::{partial_ratio, ratio, token_set_ratio, BlendedRatio, FuzzyMatcher};
pub use recent::{RecentCreatedBuffer, RECENT_CAPACITY};
pub use record::{TaskDue, TaskRecord};
pub use target::{is_last_reference, parse_task_id};
