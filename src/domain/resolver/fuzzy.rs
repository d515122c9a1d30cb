//! String similarity scores on a 0..=100 scale.
//!
//! `ratio` is `strsim`'s normalized Levenshtein similarity. `partial_ratio`
//! and `token_set_ratio` build on it the way common fuzzy matching libraries
//! do.

use std::collections::BTreeSet;

/// Scores how well a query matches a record haystack.
pub trait FuzzyMatcher: Send + Sync {
    fn score(&self, query: &str, haystack: &str) -> f64;
}

/// Maximum of [`partial_ratio`] and [`token_set_ratio`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BlendedRatio;

impl FuzzyMatcher for BlendedRatio {
    fn score(&self, query: &str, haystack: &str) -> f64 {
        partial_ratio(query, haystack).max(token_set_ratio(query, haystack))
    }
}

/// Normalized Levenshtein similarity.
pub fn ratio(a: &str, b: &str) -> f64 {
    100.0 * strsim::normalized_levenshtein(a, b)
}

/// Best [`ratio`] of the shorter string against every same-length window of
/// the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let window = short.chars().count();
    if window == 0 {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    // Byte offset of every char start, plus the end.
    let bounds: Vec<usize> = long
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(long.len()))
        .collect();
    let alphabet: BTreeSet<char> = short.chars().collect();
    let last_start = bounds.len() - 1 - window;
    let mut best = 0.0f64;
    for (start, ch) in long.chars().enumerate().take(last_start + 1) {
        // A window starting on a character absent from the query can't beat
        // the one starting at the next matching character, except at the end.
        if start != last_start && !alphabet.contains(&ch) {
            continue;
        }
        let score = ratio(short, &long[bounds[start]..bounds[start + window]]);
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

fn tokens(s: &str) -> BTreeSet<&str> {
    s.split_whitespace().collect()
}

fn join(parts: &BTreeSet<&str>) -> String {
    parts.iter().copied().collect::<Vec<_>>().join(" ")
}

/// Compares the shared token set against each side's remainder.
///
/// Returns 100 when one side's tokens are a subset of the other's.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let common: BTreeSet<&str> = ta.intersection(&tb).copied().collect();
    let only_a: BTreeSet<&str> = ta.difference(&tb).copied().collect();
    let only_b: BTreeSet<&str> = tb.difference(&ta).copied().collect();
    if !common.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let sect = join(&common);
    let with = |rest: &BTreeSet<&str>| {
        let rest = join(rest);
        match (sect.is_empty(), rest.is_empty()) {
            (true, _) => rest,
            (_, true) => sect.clone(),
            _ => format!("{sect} {rest}"),
        }
    };
    let combined_a = with(&only_a);
    let combined_b = with(&only_b);

    let mut best = ratio(&combined_a, &combined_b);
    if !sect.is_empty() {
        best = best
            .max(ratio(&sect, &combined_a))
            .max(ratio(&sect, &combined_b));
    }
    best
}
