use crate::cache::CachingSimilarity;
use crate::deadline::Deadline;
use crate::error::RecommendError;
use crate::item_based::ItemBasedRecommender;
use crate::neighborhood::NeighborhoodStrategy;
use crate::recommender::Recommender;
use crate::similarity::similarity_for;
use crate::user_based::UserBasedRecommender;
use cfrec_core::config::{CacheConfig, RecommenderConfig};
use cfrec_core::metrics::{MetricsCollector, MetricsSnapshot};
use cfrec_core::model::{ItemId, Neighbor, Recommendation, UserId};
use std::sync::Arc;
use std::time::Instant;
use storage::RatingStore;
use tracing::{debug, info, warn};

const DEFAULT_METRICS_HISTORY: usize = 1024;

/// Entry point for queries against one immutable store snapshot.
///
/// Holds a user-based and an item-based recommender built from configuration,
/// optional similarity caches in front of each, and a metrics collector that
/// records every request.
pub struct RecommenderEngine {
    store: Arc<RatingStore>,
    user_based: UserBasedRecommender,
    item_based: ItemBasedRecommender,
    caches: Vec<Arc<CachingSimilarity>>,
    metrics: MetricsCollector,
    default_how_many: usize,
}

impl RecommenderEngine {
    pub fn new(store: Arc<RatingStore>, config: &RecommenderConfig) -> Self {
        let no_cache = CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        };
        Self::with_cache(store, config, &no_cache)
    }

    pub fn with_cache(
        store: Arc<RatingStore>,
        config: &RecommenderConfig,
        cache: &CacheConfig,
    ) -> Self {
        let (user_similarity, user_cache) =
            CachingSimilarity::wrap(similarity_for(config.user_similarity), cache);
        let (item_similarity, item_cache) =
            CachingSimilarity::wrap(similarity_for(config.item_similarity), cache);

        info!(
            "Recommender engine ready: {} users, {} items, {} ratings (user similarity {:?}, item similarity {:?}, cache {})",
            store.num_users(),
            store.num_items(),
            store.num_ratings(),
            config.user_similarity,
            config.item_similarity,
            if cache.enabled { "on" } else { "off" }
        );

        Self {
            user_based: UserBasedRecommender::new(
                store.clone(),
                user_similarity,
                NeighborhoodStrategy::from_config(config),
            ),
            item_based: ItemBasedRecommender::new(store.clone(), item_similarity),
            caches: user_cache.into_iter().chain(item_cache).collect(),
            metrics: MetricsCollector::new(DEFAULT_METRICS_HISTORY),
            default_how_many: config.how_many,
            store,
        }
    }

    /// Share a collector with other components (e.g. ingestion).
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn store(&self) -> &Arc<RatingStore> {
        &self.store
    }

    pub fn user_based(&self) -> &UserBasedRecommender {
        &self.user_based
    }

    pub fn item_based(&self) -> &ItemBasedRecommender {
        &self.item_based
    }

    pub fn default_how_many(&self) -> usize {
        self.default_how_many
    }

    pub fn recommend_for_user(
        &self,
        user_id: UserId,
        how_many: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        self.recommend_for_user_until(user_id, how_many, Deadline::none())
    }

    pub fn recommend_for_user_until(
        &self,
        user_id: UserId,
        how_many: usize,
        deadline: Deadline,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        self.observe("recommend_for_user", || {
            self.user_based.recommend_until(user_id, how_many, deadline)
        })
    }

    pub fn recommend_because_of_item(
        &self,
        user_id: UserId,
        item_id: ItemId,
        how_many: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        self.recommend_because_of_item_until(user_id, item_id, how_many, Deadline::none())
    }

    pub fn recommend_because_of_item_until(
        &self,
        user_id: UserId,
        item_id: ItemId,
        how_many: usize,
        deadline: Deadline,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        self.observe("recommend_because_of_item", || {
            self.item_based
                .recommended_because_until(user_id, item_id, how_many, deadline)
        })
    }

    /// Item-based predictions for every item the user has not rated.
    pub fn recommend_items_for_user(
        &self,
        user_id: UserId,
        how_many: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        self.observe("recommend_items_for_user", || {
            self.item_based.recommend(user_id, how_many)
        })
    }

    pub fn estimate_preference(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<Option<f64>, RecommendError> {
        self.observe("estimate_preference", || {
            self.user_based.estimate_preference(user_id, item_id)
        })
    }

    pub fn nearest_users(&self, user_id: UserId, n: usize) -> Result<Vec<Neighbor>, RecommendError> {
        self.user_based.nearest_users(user_id, n)
    }

    pub fn most_similar_items(
        &self,
        item_id: ItemId,
        n: usize,
    ) -> Result<Vec<Neighbor>, RecommendError> {
        self.item_based.most_similar_items(item_id, n)
    }

    pub fn metrics_collector(&self) -> MetricsCollector {
        self.metrics.clone()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        let (hits, misses) = self
            .caches
            .iter()
            .fold((0, 0), |(h, m), cache| (h + cache.hits(), m + cache.misses()));
        self.metrics.set_similarity_cache(hits, misses);
        self.metrics.snapshot()
    }

    fn observe<T>(
        &self,
        operation: &str,
        f: impl FnOnce() -> Result<T, RecommendError>,
    ) -> Result<T, RecommendError> {
        let start = Instant::now();
        let result = f();
        let latency_us = start.elapsed().as_micros() as u64;
        self.metrics.record_request(latency_us, result.is_ok());

        match &result {
            Ok(_) => debug!("{} completed in {} us", operation, latency_us),
            Err(e) => warn!("{} failed after {} us: {}", operation, latency_us, e),
        }
        result
    }
}
