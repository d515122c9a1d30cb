//! Home-timezone datetime normalization.
//!
//! Every conversion is total: input that cannot be parsed (or a local time
//! that falls into a DST gap) comes back unchanged, so callers never have to
//! handle a temporal error.

use chrono::{
    DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
    Utc,
};
use chrono_tz::Tz;
use tracing::warn;

/// Placeholder shown in previews for a missing datetime.
pub const EMPTY_WALL_CLOCK: &str = "—";

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
const UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const AWARE_PATTERNS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_PATTERNS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A parsed datetime string.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Parsed {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

fn parse(input: &str) -> Option<Parsed> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    // Trailing Z is UTC.
    let normalized = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        Some(head) => format!("{head}+00:00"),
        None => s.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(Parsed::Aware(dt));
    }
    for pattern in AWARE_PATTERNS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, pattern) {
            return Some(Parsed::Aware(dt));
        }
    }
    for pattern in NAIVE_PATTERNS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, pattern) {
            return Some(Parsed::Naive(dt));
        }
    }
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .map(|d| Parsed::Naive(d.and_time(NaiveTime::MIN)))
}

fn drop_subsec(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Converts datetime strings relative to a configured home timezone.
///
/// Naive values are read as home wall clock and values with an offset are
/// converted into the home zone. That already covers the local-intent case,
/// so the `force_local` flag of [`Self::to_local_with_offset`] and the
/// `original_input` of [`Self::format_local_wall`] never change the output;
/// they are kept for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeNormalizer {
    tz: Tz,
}

impl Default for DateTimeNormalizer {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl DateTimeNormalizer {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Builds a normalizer from an IANA name, falling back to UTC.
    pub fn from_name(name: &str) -> Self {
        match name.trim().parse::<Tz>() {
            Ok(tz) => Self::new(tz),
            Err(_) => {
                warn!(timezone = name, "Unknown timezone, falling back to UTC");
                Self::new(Tz::UTC)
            }
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Attaches the home timezone to a naive wall-clock value.
    ///
    /// Ambiguous times (DST fall-back) take the earlier instant; times in a
    /// DST gap have no instant and yield `None`.
    fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Some(dt),
            LocalResult::Ambiguous(earliest, _) => Some(earliest),
            LocalResult::None => None,
        }
    }

    /// Converts to a UTC instant with seconds precision and a literal `Z`.
    ///
    /// Values without an offset are read as home-zone wall clock.
    pub fn to_utc_instant(&self, input: &str) -> String {
        let utc = match parse(input) {
            Some(Parsed::Aware(dt)) => dt.with_timezone(&Utc),
            Some(Parsed::Naive(naive)) => match self.localize(naive) {
                Some(local) => local.with_timezone(&Utc),
                None => return input.to_string(),
            },
            None => return input.to_string(),
        };
        utc.format(UTC_FORMAT).to_string()
    }

    /// Strips any offset while keeping the wall-clock digits as written.
    pub fn to_local_naive(&self, input: &str) -> String {
        match parse(input) {
            Some(Parsed::Aware(dt)) => drop_subsec(dt.naive_local()).format(NAIVE_FORMAT).to_string(),
            Some(Parsed::Naive(naive)) => drop_subsec(naive).format(NAIVE_FORMAT).to_string(),
            None => input.to_string(),
        }
    }

    /// Produces a value with an explicit home-zone offset, for sending to the store.
    ///
    /// Naive values get the home offset attached. Values with an offset are
    /// converted to the home zone so the persisted wall clock matches the
    /// preview.
    pub fn to_local_with_offset(&self, input: &str, force_local: bool) -> String {
        let local = match parse(input) {
            Some(Parsed::Naive(naive)) => match self.localize(drop_subsec(naive)) {
                Some(local) => local,
                None => return input.to_string(),
            },
            Some(Parsed::Aware(dt)) => dt.with_timezone(&self.tz),
            None => return input.to_string(),
        };
        tracing::trace!(input, force_local, "Localized datetime for store");
        local.format(OFFSET_FORMAT).to_string()
    }

    /// Human-readable wall clock for previews.
    ///
    /// Values carrying an offset are always shown in the home zone, whatever
    /// the original text suggested. Missing values render as a dash.
    pub fn format_local_wall(&self, input: Option<&str>, original_input: &str) -> String {
        let Some(value) = input.map(str::trim).filter(|v| !v.is_empty()) else {
            return EMPTY_WALL_CLOCK.to_string();
        };
        let wall = match parse(value) {
            Some(Parsed::Aware(dt)) => dt.with_timezone(&self.tz).naive_local(),
            Some(Parsed::Naive(naive)) => naive,
            None => return value.to_string(),
        };
        tracing::trace!(value, original_input, "Formatted wall clock");
        drop_subsec(wall).format(NAIVE_FORMAT).to_string()
    }

    /// Calendar date of a store due value in the home zone.
    ///
    /// Values with an offset are converted; naive values and plain dates are
    /// taken literally.
    pub fn local_date_of(&self, input: &str) -> Option<NaiveDate> {
        match parse(input)? {
            Parsed::Aware(dt) => Some(dt.with_timezone(&self.tz).date_naive()),
            Parsed::Naive(naive) => Some(naive.date()),
        }
    }

    /// Today's date in the home zone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    /// `YYYY-MM-DD HH:MM` stamp in the home zone, used for description updates.
    pub fn stamp(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.tz).format("%Y-%m-%d %H:%M").to_string()
    }
}
