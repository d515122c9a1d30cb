//! EntityResolver - resolves task references against the cached active tasks.
//!
//! Owns the process-wide [`ActiveTaskCache`] and [`RecentCreatedBuffer`].
//! Every mutating store call made through the application layer must be
//! followed by [`EntityResolver::refresh`] so later resolutions in the same
//! interaction see the change.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::datetime::DateTimeNormalizer;
use crate::domain::extraction::TaskQuery;
use crate::domain::foundation::TaskId;
use crate::domain::projects::ProjectDirectory;
use crate::domain::resolver::{
    resolve, ActiveTaskCache, BlendedRatio, FuzzyMatcher, RecentCreatedBuffer, ResolveContext,
    TaskRecord, RECENT_CAPACITY,
};
use crate::ports::TaskStore;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_MIN_SCORE: f64 = 70.0;

pub struct EntityResolver {
    store: Arc<dyn TaskStore>,
    cache: Mutex<ActiveTaskCache>,
    recent: Mutex<RecentCreatedBuffer>,
    projects: ProjectDirectory,
    normalizer: DateTimeNormalizer,
    min_score: f64,
    matcher: Option<Arc<dyn FuzzyMatcher>>,
}

impl EntityResolver {
    pub fn new(
        store: Arc<dyn TaskStore>,
        projects: ProjectDirectory,
        normalizer: DateTimeNormalizer,
    ) -> Self {
        Self {
            store,
            cache: Mutex::new(ActiveTaskCache::new(DEFAULT_CACHE_TTL)),
            recent: Mutex::new(RecentCreatedBuffer::with_capacity(RECENT_CAPACITY)),
            projects,
            normalizer,
            min_score: DEFAULT_MIN_SCORE,
            matcher: Some(Arc::new(BlendedRatio)),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = Mutex::new(ActiveTaskCache::new(ttl));
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    /// `None` turns the fuzzy tier off.
    pub fn with_matcher(mut self, matcher: Option<Arc<dyn FuzzyMatcher>>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn projects(&self) -> &ProjectDirectory {
        &self.projects
    }

    pub fn normalizer(&self) -> &DateTimeNormalizer {
        &self.normalizer
    }

    /// Active tasks, refetched when the snapshot is stale.
    ///
    /// A failed fetch keeps serving the previous snapshot and leaves it stale
    /// so the next read tries again.
    pub async fn active_tasks(&self) -> Vec<TaskRecord> {
        let mut cache = self.cache.lock().await;
        if cache.is_stale(Instant::now()) {
            match self.store.get_tasks(&TaskQuery::default()).await {
                Ok(items) => {
                    debug!(count = items.len(), "Refreshed active task cache");
                    cache.replace(items, Instant::now());
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load active tasks, using previous snapshot");
                }
            }
        }
        cache.items().to_vec()
    }

    /// Bypasses the TTL. Call after every create, update, move, close or reopen.
    pub async fn refresh(&self) -> Vec<TaskRecord> {
        self.cache.lock().await.invalidate();
        self.active_tasks().await
    }

    pub async fn record_created(&self, id: TaskId) {
        self.recent.lock().await.push(id);
    }

    pub async fn last_created(&self) -> Option<TaskId> {
        self.recent.lock().await.last().cloned()
    }

    pub async fn recent_created(&self) -> Vec<TaskId> {
        self.recent.lock().await.iter().cloned().collect()
    }

    /// Resolves `target` (falling back to `fallback` for id lookups) against
    /// the active tasks.
    pub async fn resolve(&self, target: &str, fallback: Option<&str>) -> Vec<TaskRecord> {
        let records = self.active_tasks().await;
        let last = self.last_created().await;
        let ctx = ResolveContext {
            projects: &self.projects,
            normalizer: &self.normalizer,
            today: self.normalizer.today(Utc::now()),
            last_created: last.as_ref(),
            min_score: self.min_score,
            matcher: self.matcher.as_deref(),
        };
        resolve(&records, target, fallback, &ctx)
    }
}
