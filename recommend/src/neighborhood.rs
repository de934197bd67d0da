use crate::deadline::Deadline;
use crate::error::RecommendError;
use crate::similarity::{SimilarityMeasure, SimilarityResult};
use cfrec_core::config::RecommenderConfig;
use cfrec_core::model::{EntityKind, Neighbor};
use std::sync::Arc;
use storage::RatingStore;
use tracing::trace;

/// How peers are chosen around a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NeighborhoodStrategy {
    /// The `n` most similar peers, optionally ignoring those below a floor.
    NearestN {
        n: usize,
        min_similarity: Option<f64>,
    },
    /// Every peer whose similarity is at least `min_similarity`.
    Threshold { min_similarity: f64 },
}

impl NeighborhoodStrategy {
    pub fn nearest(n: usize) -> Self {
        Self::NearestN {
            n,
            min_similarity: None,
        }
    }

    pub fn from_config(config: &RecommenderConfig) -> Self {
        Self::NearestN {
            n: config.neighborhood_size,
            min_similarity: config.similarity_threshold,
        }
    }

    fn limit(&self) -> usize {
        match self {
            Self::NearestN { n, .. } => *n,
            Self::Threshold { .. } => usize::MAX,
        }
    }

    fn floor(&self) -> Option<f64> {
        match self {
            Self::NearestN { min_similarity, .. } => *min_similarity,
            Self::Threshold { min_similarity } => Some(*min_similarity),
        }
    }
}

/// Top-`n` candidates by descending similarity to `target`, ties broken by
/// ascending peer id.
///
/// Candidates whose similarity is undefined are dropped rather than scored 0.
/// With `exclude_self` the target never appears in its own neighborhood.
pub fn nearest_n<I, F>(
    target: i64,
    n: usize,
    candidates: I,
    similarity_fn: F,
    exclude_self: bool,
) -> Vec<Neighbor>
where
    I: IntoIterator<Item = i64>,
    F: FnMut(i64) -> SimilarityResult,
{
    rank(target, n, None, candidates, similarity_fn, exclude_self)
}

fn rank<I, F>(
    target: i64,
    limit: usize,
    floor: Option<f64>,
    candidates: I,
    mut similarity_fn: F,
    exclude_self: bool,
) -> Vec<Neighbor>
where
    I: IntoIterator<Item = i64>,
    F: FnMut(i64) -> SimilarityResult,
{
    if limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<Neighbor> = candidates
        .into_iter()
        .filter(|peer| !(exclude_self && *peer == target))
        .filter_map(|peer| match similarity_fn(peer) {
            Ok(similarity) if similarity.is_finite() => Some(Neighbor {
                peer_id: peer,
                similarity,
            }),
            Ok(_) => None,
            Err(e) => {
                trace!("Dropping peer {} of {}: {}", peer, target, e);
                None
            }
        })
        .filter(|neighbor| floor.map_or(true, |min| neighbor.similarity >= min))
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then(a.peer_id.cmp(&b.peer_id))
    });
    scored.truncate(limit);
    scored
}

/// Builds neighborhoods of users or items from a store and a measure.
#[derive(Clone)]
pub struct NeighborhoodSelector {
    store: Arc<RatingStore>,
    similarity: Arc<dyn SimilarityMeasure>,
}

impl NeighborhoodSelector {
    pub fn new(store: Arc<RatingStore>, similarity: Arc<dyn SimilarityMeasure>) -> Self {
        Self { store, similarity }
    }

    pub fn similarity(&self) -> &Arc<dyn SimilarityMeasure> {
        &self.similarity
    }

    /// The `n` peers of `target` most similar to it. Fails only when `target`
    /// is unknown; a sparse neighborhood is simply shorter.
    pub fn nearest_n(
        &self,
        kind: EntityKind,
        target: i64,
        n: usize,
        exclude_self: bool,
    ) -> Result<Vec<Neighbor>, RecommendError> {
        self.select(
            kind,
            target,
            NeighborhoodStrategy::nearest(n),
            exclude_self,
            Deadline::none(),
        )
    }

    /// Neighborhood of `target` under `strategy`, never including `target`.
    pub fn neighborhood(
        &self,
        kind: EntityKind,
        target: i64,
        strategy: NeighborhoodStrategy,
        deadline: Deadline,
    ) -> Result<Vec<Neighbor>, RecommendError> {
        self.select(kind, target, strategy, true, deadline)
    }

    fn select(
        &self,
        kind: EntityKind,
        target: i64,
        strategy: NeighborhoodStrategy,
        exclude_self: bool,
        deadline: Deadline,
    ) -> Result<Vec<Neighbor>, RecommendError> {
        let store = self.store.as_ref();
        let known = match kind {
            EntityKind::User => store.contains_user(target),
            EntityKind::Item => store.contains_item(target),
        };
        if !known {
            return Err(RecommendError::UnknownEntity { kind, id: target });
        }

        let candidates: Box<dyn Iterator<Item = i64> + '_> = match kind {
            EntityKind::User => Box::new(store.user_ids()),
            EntityKind::Item => Box::new(store.item_ids()),
        };
        let candidates = candidates.take_while(|_| !deadline.is_expired());

        let neighbors = rank(
            target,
            strategy.limit(),
            strategy.floor(),
            candidates,
            |peer| self.similarity.similarity(store, kind, target, peer),
            exclude_self,
        );
        deadline.check()?;
        Ok(neighbors)
    }
}
