//! TTL snapshot of active store tasks.

use std::time::{Duration, Instant};

use super::record::TaskRecord;

/// Snapshot `{items, fetched_at, ttl}`. Stale once `now - fetched_at >= ttl`;
/// a never-filled or invalidated cache is always stale.
#[derive(Debug, Clone)]
pub struct ActiveTaskCache {
    items: Vec<TaskRecord>,
    fetched_at: Option<Instant>,
    ttl: Duration,
}

impl ActiveTaskCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            items: Vec::new(),
            fetched_at: None,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_stale(&self, now: Instant) -> bool {
        match self.fetched_at {
            Some(at) => now.saturating_duration_since(at) >= self.ttl,
            None => true,
        }
    }

    /// Forces the next read to refetch. Items stay readable until replaced.
    pub fn invalidate(&mut self) {
        self.fetched_at = None;
    }

    pub fn replace(&mut self, items: Vec<TaskRecord>, now: Instant) {
        self.items = items;
        self.fetched_at = Some(now);
    }

    pub fn items(&self) -> &[TaskRecord] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TaskId;

    #[test]
    fn empty_cache_is_stale() {
        assert!(ActiveTaskCache::new(Duration::from_secs(60)).is_stale(Instant::now()));
    }

    #[test]
    fn becomes_stale_exactly_at_ttl() {
        let mut cache = ActiveTaskCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache.replace(vec![TaskRecord::new(TaskId::new("1").unwrap(), "x")], start);

        assert!(!cache.is_stale(start + Duration::from_secs(59)));
        assert!(cache.is_stale(start + Duration::from_secs(60)));
    }

    #[test]
    fn invalidate_forces_refetch_but_keeps_items() {
        let mut cache = ActiveTaskCache::new(Duration::from_secs(3600));
        let start = Instant::now();
        cache.replace(vec![TaskRecord::new(TaskId::new("1").unwrap(), "x")], start);
        cache.invalidate();
        assert!(cache.is_stale(start));
        assert_eq!(cache.items().len(), 1);
    }

    #[test]
    fn zero_ttl_is_always_stale() {
        let mut cache = ActiveTaskCache::new(Duration::ZERO);
        let now = Instant::now();
        cache.replace(Vec::new(), now);
        assert!(cache.is_stale(now));
    }
}
