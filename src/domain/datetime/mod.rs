//! Timezone-aware conversions between naive, offset-carrying and UTC
//! datetime strings, plus the heuristics that decide whether a user meant
//! local wall-clock time.

mod normalizer;
mod relative;

pub use normalizer::{DateTimeNormalizer, EMPTY_WALL_CLOCK};
pub use relative::{force_local, RelativeDay};
