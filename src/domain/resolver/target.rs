//! Parsing of explicit task references.

use url::Url;

use crate::domain::foundation::TaskId;

const LAST_SYNONYMS: &[&str] = &[
    "last",
    "latest",
    "the last one",
    "последняя",
    "последний",
    "последнюю",
    "последнее",
];

fn numeric(s: &str) -> Option<TaskId> {
    let s = s.trim();
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        TaskId::new(s).ok()
    } else {
        None
    }
}

/// Extracts a task id from a bare number, a `?id=<n>` query parameter, or a
/// `/task/<n>` path ending.
pub fn parse_task_id(text: &str) -> Option<TaskId> {
    let text = text.trim();
    if let Some(id) = numeric(text) {
        return Some(id);
    }
    let url = Url::parse(text).ok()?;
    if let Some(id) = url
        .query_pairs()
        .find(|(key, _)| key == "id")
        .and_then(|(_, value)| numeric(&value))
    {
        return Some(id);
    }
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [.., "task", last] => numeric(last),
        _ => None,
    }
}

/// True when the reference means "the most recently created task".
pub fn is_last_reference(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    LAST_SYNONYMS.contains(&lowered.as_str())
}
