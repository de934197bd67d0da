use crate::deadline::Deadline;
use crate::error::RecommendError;
use crate::neighborhood::{NeighborhoodSelector, NeighborhoodStrategy};
use crate::recommender::{top_recommendations, Recommender, WeightedAverage};
use crate::similarity::SimilarityMeasure;
use cfrec_core::model::{EntityKind, ItemId, Neighbor, Recommendation, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;
use storage::RatingStore;
use tracing::debug;

/// Recommends items liked by the users most similar to the target.
///
/// For each item rated by at least one neighbor but not by the target user,
/// the prediction is `Σ sim(u, n)·r(n, i) / Σ |sim(u, n)|` over the neighbors
/// `n` who rated `i`.
#[derive(Clone)]
pub struct UserBasedRecommender {
    store: Arc<RatingStore>,
    selector: NeighborhoodSelector,
    strategy: NeighborhoodStrategy,
}

impl UserBasedRecommender {
    pub fn new(
        store: Arc<RatingStore>,
        similarity: Arc<dyn SimilarityMeasure>,
        strategy: NeighborhoodStrategy,
    ) -> Self {
        let selector = NeighborhoodSelector::new(store.clone(), similarity);
        Self {
            store,
            selector,
            strategy,
        }
    }

    pub fn strategy(&self) -> NeighborhoodStrategy {
        self.strategy
    }

    pub fn neighborhood(
        &self,
        user_id: UserId,
        deadline: Deadline,
    ) -> Result<Vec<Neighbor>, RecommendError> {
        self.selector
            .neighborhood(EntityKind::User, user_id, self.strategy, deadline)
    }

    /// The `n` users most similar to `user_id`.
    pub fn nearest_users(&self, user_id: UserId, n: usize) -> Result<Vec<Neighbor>, RecommendError> {
        self.selector.nearest_n(EntityKind::User, user_id, n, true)
    }
}

impl Recommender for UserBasedRecommender {
    fn recommend_until(
        &self,
        user_id: UserId,
        how_many: usize,
        deadline: Deadline,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let neighbors = self.neighborhood(user_id, deadline)?;
        let rated = self.store.user_ratings(user_id);

        let mut estimates: BTreeMap<ItemId, WeightedAverage> = BTreeMap::new();
        for neighbor in &neighbors {
            deadline.check()?;
            for (item_id, value) in self.store.user_ratings(neighbor.peer_id) {
                if rated.contains_key(item_id) {
                    continue;
                }
                estimates
                    .entry(*item_id)
                    .or_default()
                    .add(neighbor.similarity, *value as f64);
            }
        }

        let recommendations = top_recommendations(
            estimates
                .into_iter()
                .filter_map(|(item_id, avg)| avg.value().map(|v| (item_id, v))),
            how_many,
        );
        debug!(
            "User {}: {} neighbors, {} recommendations",
            user_id,
            neighbors.len(),
            recommendations.len()
        );
        Ok(recommendations)
    }

    fn estimate_preference(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<Option<f64>, RecommendError> {
        if !self.store.contains_user(user_id) {
            return Err(RecommendError::unknown_user(user_id));
        }
        if !self.store.contains_item(item_id) {
            return Err(RecommendError::unknown_item(item_id));
        }
        if let Some(value) = self.store.preference(user_id, item_id) {
            return Ok(Some(value as f64));
        }

        let neighbors = self.neighborhood(user_id, Deadline::none())?;
        let mut avg = WeightedAverage::default();
        for neighbor in &neighbors {
            if let Some(value) = self.store.preference(neighbor.peer_id, item_id) {
                avg.add(neighbor.similarity, value as f64);
            }
        }
        Ok(avg.value())
    }
}
