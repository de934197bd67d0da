use crate::deadline::Deadline;
use crate::error::RecommendError;
use cfrec_core::model::{ItemId, Recommendation, UserId};

/// Common surface of the user-based and item-based recommenders.
pub trait Recommender: Send + Sync {
    /// Up to `how_many` items the user has not rated, best first.
    fn recommend(
        &self,
        user_id: UserId,
        how_many: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        self.recommend_until(user_id, how_many, Deadline::none())
    }

    fn recommend_until(
        &self,
        user_id: UserId,
        how_many: usize,
        deadline: Deadline,
    ) -> Result<Vec<Recommendation>, RecommendError>;

    /// Predicted preference of `user_id` for `item_id`; the stored value when
    /// the user already rated it, `None` when nothing supports a prediction.
    fn estimate_preference(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<Option<f64>, RecommendError>;
}

/// Weighted average accumulator: `Σ w·r / Σ |w|`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WeightedAverage {
    numerator: f64,
    denominator: f64,
}

impl WeightedAverage {
    pub(crate) fn add(&mut self, weight: f64, value: f64) {
        self.numerator += weight * value;
        self.denominator += weight.abs();
    }

    /// `None` when every contributing weight was zero.
    pub(crate) fn value(&self) -> Option<f64> {
        if self.denominator > 0.0 {
            let v = self.numerator / self.denominator;
            v.is_finite().then_some(v)
        } else {
            None
        }
    }
}

/// Sort descending by value, ties by ascending item id, keep `how_many`.
pub(crate) fn top_recommendations<I>(scores: I, how_many: usize) -> Vec<Recommendation>
where
    I: IntoIterator<Item = (ItemId, f64)>,
{
    let mut ranked: Vec<Recommendation> = scores
        .into_iter()
        .filter(|(_, value)| value.is_finite())
        .map(|(item_id, value)| Recommendation::new(item_id, value))
        .collect();

    ranked.sort_by(|a, b| b.value.total_cmp(&a.value).then(a.item_id.cmp(&b.item_id)));
    ranked.truncate(how_many);
    ranked
}
