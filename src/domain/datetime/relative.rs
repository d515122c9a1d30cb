//! Relative-day keywords and the local-intent heuristic.

use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static ZONE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\butc\b|\bgmt\b|\+\d|(?:^|\s|\d{1,2}:\d{2}(?::\d{2})?)-\d|\bz\b|\dz\b")
        .expect("zone marker pattern is valid")
});

static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}:\d{2}\b").expect("clock pattern is valid"));

/// A day named relative to "now" in the home timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDay {
    Today,
    Tomorrow,
    DayAfterTomorrow,
}

impl RelativeDay {
    // Longer phrases first: "послезавтра" contains "завтра".
    const KEYWORDS: &'static [(&'static str, RelativeDay)] = &[
        ("day after tomorrow", RelativeDay::DayAfterTomorrow),
        ("послезавтра", RelativeDay::DayAfterTomorrow),
        ("tomorrow", RelativeDay::Tomorrow),
        ("завтра", RelativeDay::Tomorrow),
        ("today", RelativeDay::Today),
        ("сегодня", RelativeDay::Today),
    ];

    /// Finds the first relative-day keyword in `text` (case-insensitive).
    pub fn detect(text: &str) -> Option<Self> {
        Self::detect_keyword(text).map(|(day, _)| day)
    }

    /// Like [`RelativeDay::detect`], also returning the matched keyword.
    pub fn detect_keyword(text: &str) -> Option<(Self, &'static str)> {
        let lowered = text.to_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(word, _)| lowered.contains(word))
            .map(|(word, day)| (*day, *word))
    }

    pub fn offset_days(&self) -> u64 {
        match self {
            RelativeDay::Today => 0,
            RelativeDay::Tomorrow => 1,
            RelativeDay::DayAfterTomorrow => 2,
        }
    }

    /// Resolves against the local calendar date of "now".
    pub fn resolve(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_days(Days::new(self.offset_days()))
            .unwrap_or(today)
    }
}

/// Decides whether an ambiguous time in `text` should be read as home-zone
/// wall clock time.
///
/// Explicit zone markers (`UTC`, `GMT`, numeric offsets, a bare `Z`) win and
/// return false. Otherwise relative-day words or a bare `HH:MM` return true.
pub fn force_local(text: &str) -> bool {
    let lowered = text.to_lowercase();
    if ZONE_MARKER.is_match(&lowered) {
        return false;
    }
    RelativeDay::detect(&lowered).is_some() || CLOCK_TIME.is_match(&lowered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_keywords_in_both_languages() {
        assert_eq!(RelativeDay::detect("call mom TODAY"), Some(RelativeDay::Today));
        assert_eq!(RelativeDay::detect("позвонить завтра"), Some(RelativeDay::Tomorrow));
        assert_eq!(RelativeDay::detect("next week"), None);
    }

    #[test]
    fn day_after_tomorrow_is_not_tomorrow() {
        assert_eq!(
            RelativeDay::detect("встреча послезавтра"),
            Some(RelativeDay::DayAfterTomorrow)
        );
        assert_eq!(
            RelativeDay::detect("the day after tomorrow"),
            Some(RelativeDay::DayAfterTomorrow)
        );
    }

    #[test]
    fn resolve_adds_offset() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(
            RelativeDay::Tomorrow.resolve(today),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
    }

    #[test]
    fn relative_word_forces_local() {
        assert!(force_local("remind me tomorrow to pay rent"));
        assert!(force_local("сегодня купить хлеб"));
    }

    #[test]
    fn bare_clock_time_forces_local() {
        assert!(force_local("meeting at 15:30 with Anna"));
    }

    #[test]
    fn explicit_zone_markers_win() {
        assert!(!force_local("call at 15:00 UTC"));
        assert!(!force_local("tomorrow 10:00 GMT"));
        assert!(!force_local("today 09:00+03:00"));
        assert!(!force_local("deploy at 12:00z"));
        assert!(!force_local("sync 10:00-05:00"));
    }

    #[test]
    fn words_containing_z_do_not_count_as_zone() {
        assert!(force_local("zoom call today"));
        assert!(force_local("pizza at 19:00"));
    }

    #[test]
    fn dates_with_dashes_are_not_offsets() {
        assert!(force_local("on 2024-05-01 at 10:00"));
    }

    #[test]
    fn plain_text_is_not_forced() {
        assert!(!force_local("buy milk"));
        assert!(!force_local(""));
    }
}
