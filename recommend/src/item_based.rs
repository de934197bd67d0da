use crate::deadline::Deadline;
use crate::error::RecommendError;
use crate::neighborhood::{nearest_n, NeighborhoodSelector};
use crate::recommender::{top_recommendations, Recommender, WeightedAverage};
use crate::similarity::SimilarityMeasure;
use cfrec_core::model::{EntityKind, ItemId, Neighbor, Recommendation, UserId};
use std::sync::Arc;
use storage::{Preferences, RatingStore};
use tracing::debug;

/// Recommends items by their similarity to items the user already rated.
#[derive(Clone)]
pub struct ItemBasedRecommender {
    store: Arc<RatingStore>,
    similarity: Arc<dyn SimilarityMeasure>,
    selector: NeighborhoodSelector,
}

impl ItemBasedRecommender {
    pub fn new(store: Arc<RatingStore>, similarity: Arc<dyn SimilarityMeasure>) -> Self {
        let selector = NeighborhoodSelector::new(store.clone(), similarity.clone());
        Self {
            store,
            similarity,
            selector,
        }
    }

    /// Items most similar to `item_id`, whoever rated them.
    pub fn most_similar_items(
        &self,
        item_id: ItemId,
        how_many: usize,
    ) -> Result<Vec<Neighbor>, RecommendError> {
        self.selector
            .nearest_n(EntityKind::Item, item_id, how_many, true)
    }

    /// Items the user has not rated, ranked by similarity to `item_id`.
    /// Each recommendation's value is that similarity.
    pub fn recommended_because(
        &self,
        user_id: UserId,
        item_id: ItemId,
        how_many: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        self.recommended_because_until(user_id, item_id, how_many, Deadline::none())
    }

    pub fn recommended_because_until(
        &self,
        user_id: UserId,
        item_id: ItemId,
        how_many: usize,
        deadline: Deadline,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let rated = self.rated_by(user_id)?;
        if !self.store.contains_item(item_id) {
            return Err(RecommendError::unknown_item(item_id));
        }

        let store = self.store.as_ref();
        let candidates = store
            .item_ids()
            .filter(|candidate| !rated.contains_key(candidate))
            .take_while(|_| !deadline.is_expired());

        let similar = nearest_n(
            item_id,
            how_many,
            candidates,
            |candidate| self.similarity.item_similarity(store, item_id, candidate),
            true,
        );
        deadline.check()?;

        debug!(
            "User {} because of item {}: {} recommendations",
            user_id,
            item_id,
            similar.len()
        );
        Ok(similar
            .into_iter()
            .map(|n| Recommendation::new(n.peer_id, n.similarity))
            .collect())
    }

    fn rated_by(&self, user_id: UserId) -> Result<&Preferences, RecommendError> {
        if !self.store.contains_user(user_id) {
            return Err(RecommendError::unknown_user(user_id));
        }
        Ok(self.store.user_ratings(user_id))
    }

    fn estimate(&self, rated: &Preferences, item_id: ItemId) -> Option<f64> {
        let mut avg = WeightedAverage::default();
        for (rated_item, value) in rated {
            if let Ok(similarity) = self
                .similarity
                .item_similarity(&self.store, item_id, *rated_item)
            {
                avg.add(similarity, *value as f64);
            }
        }
        avg.value()
    }
}

impl Recommender for ItemBasedRecommender {
    /// Predicts `Σ sim(i, j)·r(u, j) / Σ |sim(i, j)|` over the items `j` the
    /// user rated, for every item `i` the user has not rated.
    fn recommend_until(
        &self,
        user_id: UserId,
        how_many: usize,
        deadline: Deadline,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let rated = self.rated_by(user_id)?;

        let mut estimates = Vec::new();
        for item_id in self.store.item_ids() {
            if rated.contains_key(&item_id) {
                continue;
            }
            deadline.check()?;
            if let Some(value) = self.estimate(rated, item_id) {
                estimates.push((item_id, value));
            }
        }

        Ok(top_recommendations(estimates, how_many))
    }

    fn estimate_preference(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<Option<f64>, RecommendError> {
        let rated = self.rated_by(user_id)?;
        if !self.store.contains_item(item_id) {
            return Err(RecommendError::unknown_item(item_id));
        }
        if let Some(value) = rated.get(&item_id) {
            return Ok(Some(*value as f64));
        }
        Ok(self.estimate(rated, item_id))
    }
}
