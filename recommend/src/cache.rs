use crate::similarity::{SimilarityMeasure, SimilarityResult};
use cfrec_core::config::{CacheConfig, SimilarityMetric};
use cfrec_core::model::{EntityKind, ItemId, UserId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use storage::RatingStore;

type PairKey = (EntityKind, i64, i64);

/// Memoizes another measure's results per unordered pair.
///
/// Entries are only valid for the store snapshot they were computed against;
/// build a new cache (or call `clear`) when the store changes. Once
/// `max_entries` is reached new pairs are still computed but no longer stored.
pub struct CachingSimilarity {
    inner: Arc<dyn SimilarityMeasure>,
    entries: DashMap<PairKey, SimilarityResult>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachingSimilarity {
    pub fn new(inner: Arc<dyn SimilarityMeasure>, max_entries: usize) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            max_entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Wraps `inner` when caching is enabled, otherwise returns it unchanged.
    pub fn wrap(
        inner: Arc<dyn SimilarityMeasure>,
        config: &CacheConfig,
    ) -> (Arc<dyn SimilarityMeasure>, Option<Arc<CachingSimilarity>>) {
        if !config.enabled || config.max_entries == 0 {
            return (inner, None);
        }
        let cache = Arc::new(Self::new(inner, config.max_entries));
        let measure: Arc<dyn SimilarityMeasure> = cache.clone();
        (measure, Some(cache))
    }

    fn lookup(&self, store: &RatingStore, kind: EntityKind, a: i64, b: i64) -> SimilarityResult {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let key = (kind, lo, hi);

        if let Some(cached) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return *cached;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let result = self.inner.similarity(store, kind, lo, hi);
        if self.entries.len() < self.max_entries {
            self.entries.insert(key, result);
        }
        result
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl SimilarityMeasure for CachingSimilarity {
    fn metric(&self) -> SimilarityMetric {
        self.inner.metric()
    }

    fn user_similarity(&self, store: &RatingStore, a: UserId, b: UserId) -> SimilarityResult {
        self.lookup(store, EntityKind::User, a, b)
    }

    fn item_similarity(&self, store: &RatingStore, a: ItemId, b: ItemId) -> SimilarityResult {
        self.lookup(store, EntityKind::Item, a, b)
    }
}
