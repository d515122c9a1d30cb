//! Tiered resolution of a task reference against a snapshot of records.

use chrono::NaiveDate;
use tracing::debug;

use super::fuzzy::FuzzyMatcher;
use super::record::TaskRecord;
use super::target::{is_last_reference, parse_task_id};
use crate::domain::datetime::{DateTimeNormalizer, RelativeDay};
use crate::domain::foundation::TaskId;
use crate::domain::projects::ProjectDirectory;

/// Everything a resolution needs besides the records themselves.
pub struct ResolveContext<'a> {
    pub projects: &'a ProjectDirectory,
    pub normalizer: &'a DateTimeNormalizer,
    /// Local calendar date of "now" in the home zone.
    pub today: NaiveDate,
    pub last_created: Option<&'a TaskId>,
    pub min_score: f64,
    /// `None` disables the fuzzy tier.
    pub matcher: Option<&'a dyn FuzzyMatcher>,
}

/// Which tier produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveTier {
    Id,
    Last,
    Substring,
    Fuzzy,
}

impl ResolveTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveTier::Id => "id",
            ResolveTier::Last => "last",
            ResolveTier::Substring => "substring",
            ResolveTier::Fuzzy => "fuzzy",
        }
    }
}

/// Resolves `target` to matching records.
///
/// The first applicable tier wins and later tiers never run:
/// 1. an id in `target` (or in `fallback` when `target` has none),
/// 2. a "last" reference via the recency buffer,
/// 3. substring search, narrowed by a relative-day keyword if present,
/// 4. fuzzy scoring when substring search found nothing.
pub fn resolve(
    records: &[TaskRecord],
    target: &str,
    fallback: Option<&str>,
    ctx: &ResolveContext<'_>,
) -> Vec<TaskRecord> {
    let (tier, matches) = resolve_with_tier(records, target, fallback, ctx);
    debug!(
        target = target,
        tier = tier.as_str(),
        matches = matches.len(),
        "Resolved task reference"
    );
    matches
}

pub fn resolve_with_tier(
    records: &[TaskRecord],
    target: &str,
    fallback: Option<&str>,
    ctx: &ResolveContext<'_>,
) -> (ResolveTier, Vec<TaskRecord>) {
    let id = parse_task_id(target).or_else(|| fallback.and_then(parse_task_id));
    if let Some(id) = id {
        return (ResolveTier::Id, with_id(records, &id));
    }

    if is_last_reference(target) {
        let matches = ctx
            .last_created
            .map(|id| with_id(records, id))
            .unwrap_or_default();
        return (ResolveTier::Last, matches);
    }

    let query = target.trim().to_lowercase();
    let substring = substring_matches(records, &query, ctx);
    if !substring.is_empty() {
        return (ResolveTier::Substring, substring);
    }

    (ResolveTier::Fuzzy, fuzzy_matches(records, &query, ctx))
}

fn with_id(records: &[TaskRecord], id: &TaskId) -> Vec<TaskRecord> {
    records.iter().filter(|r| &r.id == id).cloned().collect()
}

fn substring_matches(
    records: &[TaskRecord],
    query: &str,
    ctx: &ResolveContext<'_>,
) -> Vec<TaskRecord> {
    // The day keyword narrows by due date; the rest of the text is the needle.
    let (due_on, needle) = match RelativeDay::detect_keyword(query) {
        Some((day, keyword)) => (
            Some(day.resolve(ctx.today)),
            query.replacen(keyword, " ", 1).trim().to_string(),
        ),
        None => (None, query.to_string()),
    };

    records
        .iter()
        .filter(|record| match due_on {
            Some(date) => record
                .due_value()
                .and_then(|due| ctx.normalizer.local_date_of(due))
                .is_some_and(|local| local == date),
            None => true,
        })
        .filter(|record| needle.is_empty() || record.haystack(ctx.projects).contains(&needle))
        .cloned()
        .collect()
}

fn fuzzy_matches(records: &[TaskRecord], query: &str, ctx: &ResolveContext<'_>) -> Vec<TaskRecord> {
    let Some(matcher) = ctx.matcher else {
        return Vec::new();
    };

    let mut scored: Vec<(f64, &TaskRecord)> = records
        .iter()
        .map(|record| (matcher.score(query, &record.haystack(ctx.projects)), record))
        .filter(|(score, _)| *score >= ctx.min_score)
        .collect();
    // Stable: equal scores keep store order.
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, record)| record.clone()).collect()
}
