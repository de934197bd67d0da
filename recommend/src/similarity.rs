use cfrec_core::config::SimilarityMetric;
use cfrec_core::model::{EntityKind, ItemId, UserId};
use std::cmp::Ordering;
use std::sync::Arc;
use storage::{Preferences, RatingStore};
use thiserror::Error;

/// Similarity is undefined for this pair: too few co-rated entries, or a
/// rating vector with no variance. Callers drop the pair instead of scoring it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("insufficient data: {overlap} co-rated entries")]
pub struct InsufficientData {
    pub overlap: usize,
}

pub type SimilarityResult = Result<f64, InsufficientData>;

/// Pairwise similarity between two users or two items.
///
/// Implementations must be symmetric: `user_similarity(a, b)` and
/// `user_similarity(b, a)` return the same value.
pub trait SimilarityMeasure: Send + Sync {
    fn metric(&self) -> SimilarityMetric;

    /// Compares two users over the items both of them rated.
    fn user_similarity(&self, store: &RatingStore, a: UserId, b: UserId) -> SimilarityResult;

    /// Compares two items over the users who rated both of them.
    fn item_similarity(&self, store: &RatingStore, a: ItemId, b: ItemId) -> SimilarityResult;

    fn similarity(&self, store: &RatingStore, kind: EntityKind, a: i64, b: i64) -> SimilarityResult {
        match kind {
            EntityKind::User => self.user_similarity(store, a, b),
            EntityKind::Item => self.item_similarity(store, a, b),
        }
    }
}

pub fn similarity_for(metric: SimilarityMetric) -> Arc<dyn SimilarityMeasure> {
    match metric {
        SimilarityMetric::Euclidean => Arc::new(EuclideanDistance),
        SimilarityMetric::Pearson => Arc::new(PearsonCorrelation),
    }
}

/// `1 / (1 + d)`, with `d` the Euclidean distance over co-rated entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanDistance;

impl EuclideanDistance {
    pub fn score(pairs: &[(f64, f64)]) -> SimilarityResult {
        if pairs.is_empty() {
            return Err(InsufficientData { overlap: 0 });
        }
        let sum_sq: f64 = pairs.iter().map(|(x, y)| (x - y) * (x - y)).sum();
        Ok(1.0 / (1.0 + sum_sq.sqrt()))
    }
}

impl SimilarityMeasure for EuclideanDistance {
    fn metric(&self) -> SimilarityMetric {
        SimilarityMetric::Euclidean
    }

    fn user_similarity(&self, store: &RatingStore, a: UserId, b: UserId) -> SimilarityResult {
        Self::score(&co_rated(store.user_ratings(a), store.user_ratings(b)))
    }

    fn item_similarity(&self, store: &RatingStore, a: ItemId, b: ItemId) -> SimilarityResult {
        Self::score(&co_rated(store.item_ratings(a), store.item_ratings(b)))
    }
}

/// Pearson correlation over co-rated entries, in [-1, 1].
#[derive(Debug, Clone, Copy, Default)]
pub struct PearsonCorrelation;

impl PearsonCorrelation {
    pub const MIN_OVERLAP: usize = 2;

    pub fn score(pairs: &[(f64, f64)]) -> SimilarityResult {
        let n = pairs.len();
        if n < Self::MIN_OVERLAP {
            return Err(InsufficientData { overlap: n });
        }

        let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n as f64;
        let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n as f64;

        let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
        for (x, y) in pairs {
            let dx = x - mean_x;
            let dy = y - mean_y;
            sxy += dx * dy;
            sxx += dx * dx;
            syy += dy * dy;
        }

        // A constant vector has no direction to correlate with.
        if sxx == 0.0 || syy == 0.0 {
            return Err(InsufficientData { overlap: n });
        }

        Ok((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
    }
}

impl SimilarityMeasure for PearsonCorrelation {
    fn metric(&self) -> SimilarityMetric {
        SimilarityMetric::Pearson
    }

    fn user_similarity(&self, store: &RatingStore, a: UserId, b: UserId) -> SimilarityResult {
        Self::score(&co_rated(store.user_ratings(a), store.user_ratings(b)))
    }

    fn item_similarity(&self, store: &RatingStore, a: ItemId, b: ItemId) -> SimilarityResult {
        Self::score(&co_rated(store.item_ratings(a), store.item_ratings(b)))
    }
}

/// Merge-join two preference maps on their keys, in ascending key order.
pub fn co_rated(a: &Preferences, b: &Preferences) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let mut left = a.iter().peekable();
    let mut right = b.iter().peekable();

    while let (Some(&(ka, va)), Some(&(kb, vb))) = (left.peek(), right.peek()) {
        match ka.cmp(kb) {
            Ordering::Less => {
                left.next();
            }
            Ordering::Greater => {
                right.next();
            }
            Ordering::Equal => {
                out.push((*va as f64, *vb as f64));
                left.next();
                right.next();
            }
        }
    }
    out
}
