use std::sync::Arc;

use cfrec_core::config::{RecommenderConfig, SimilarityMetric};
use cfrec_core::error::{CodedError, ErrorCode};
use cfrec_core::model::EntityKind;
use recommend::{
    similarity_for, Deadline, ItemBasedRecommender, NeighborhoodSelector, NeighborhoodStrategy,
    RecommendError, Recommender, UserBasedRecommender,
};
use std::time::Instant;
use storage::RatingStore;

fn scenario_store() -> Arc<RatingStore> {
    Arc::new(
        RatingStore::from_ratings(vec![
            (0, 0, 3.0),
            (0, 1, 1.0),
            (0, 2, 4.0),
            (1, 1, 5.0),
            (1, 2, 1.0),
            (2, 0, 1.0),
            (2, 2, 5.0),
            (2, 3, 4.0),
        ])
        .unwrap(),
    )
}

/// Rows are users 0..5, columns items 0..7, zero means unrated.
fn demo_store() -> Arc<RatingStore> {
    let matrix: [[f32; 7]; 5] = [
        [3.0, 1.0, 4.0, 4.0, 1.0, 0.0, 0.0],
        [0.0, 5.0, 1.0, 0.0, 0.0, 4.0, 0.0],
        [1.0, 0.0, 5.0, 4.0, 3.0, 5.0, 2.0],
        [3.0, 1.0, 4.0, 3.0, 5.0, 0.0, 0.0],
        [5.0, 2.0, 0.0, 1.0, 0.0, 5.0, 5.0],
    ];
    let mut store = RatingStore::new();
    for (user, row) in matrix.iter().enumerate() {
        for (item, value) in row.iter().enumerate() {
            if *value > 0.0 {
                store.put(user as i64, item as i64, *value).unwrap();
            }
        }
    }
    Arc::new(store)
}

fn user_based(store: Arc<RatingStore>, metric: SimilarityMetric, n: usize) -> UserBasedRecommender {
    UserBasedRecommender::new(store, similarity_for(metric), NeighborhoodStrategy::nearest(n))
}

#[test]
fn test_two_nearest_neighbors_of_user_zero() {
    let selector = NeighborhoodSelector::new(
        scenario_store(),
        similarity_for(SimilarityMetric::Euclidean),
    );
    let neighbors = selector.nearest_n(EntityKind::User, 0, 2, true).unwrap();

    assert_eq!(neighbors.len(), 2);
    assert_eq!(neighbors[0].peer_id, 2);
    assert!((neighbors[0].similarity - 1.0 / (1.0 + 5f64.sqrt())).abs() < 1e-9);
    assert_eq!(neighbors[1].peer_id, 1);
    assert!((neighbors[1].similarity - 1.0 / 6.0).abs() < 1e-9);

    let again = selector.nearest_n(EntityKind::User, 0, 2, true).unwrap();
    assert_eq!(neighbors, again);
}

#[test]
fn test_neighborhood_never_contains_target_and_respects_size() {
    let store = demo_store();
    for metric in [SimilarityMetric::Euclidean, SimilarityMetric::Pearson] {
        let selector = NeighborhoodSelector::new(store.clone(), similarity_for(metric));
        for user in store.user_ids() {
            for n in 0..6 {
                let neighbors = selector.nearest_n(EntityKind::User, user, n, true).unwrap();
                assert!(neighbors.len() <= n);
                assert!(neighbors.iter().all(|nb| nb.peer_id != user));
                assert!(neighbors
                    .windows(2)
                    .all(|w| w[0].similarity >= w[1].similarity));
            }
        }
    }
}

#[test]
fn test_neighborhood_ties_break_by_ascending_id() {
    let selector = NeighborhoodSelector::new(demo_store(), similarity_for(SimilarityMetric::Euclidean));
    let neighbors = selector.nearest_n(EntityKind::User, 1, 4, true).unwrap();

    // Users 0 and 3 are both at distance 5 from user 1.
    let ids: Vec<i64> = neighbors.iter().map(|n| n.peer_id).collect();
    assert_eq!(ids, vec![4, 2, 0, 3]);
    assert_eq!(neighbors[2].similarity, neighbors[3].similarity);
}

#[test]
fn test_unknown_target_is_an_error() {
    let selector = NeighborhoodSelector::new(scenario_store(), similarity_for(SimilarityMetric::Pearson));
    let err = selector.nearest_n(EntityKind::Item, 99, 2, true).unwrap_err();
    assert_eq!(
        err,
        RecommendError::UnknownEntity {
            kind: EntityKind::Item,
            id: 99
        }
    );
    assert_eq!(err.error_code(), ErrorCode::NotFound);
}

#[test]
fn test_user_based_demo_recommendations_for_user_one() {
    let recommender = user_based(demo_store(), SimilarityMetric::Euclidean, 2);
    let recs = recommender.recommend(1, 3).unwrap();

    let ids: Vec<i64> = recs.iter().map(|r| r.item_id).collect();
    assert_eq!(ids, vec![6, 0, 4]);

    // Item 4 was rated by neighbor 2 only, so its estimate is that rating.
    assert!((recs[2].value - 3.0).abs() < 1e-9);

    let s4 = 1.0 / (1.0 + 10f64.sqrt());
    let s2 = 1.0 / (1.0 + 17f64.sqrt());
    let expected_item6 = (s4 * 5.0 + s2 * 2.0) / (s4 + s2);
    assert!((recs[0].value - expected_item6).abs() < 1e-6);
}

#[test]
fn test_recommendations_exclude_rated_items_for_every_user() {
    let store = demo_store();
    let user_recs = user_based(store.clone(), SimilarityMetric::Euclidean, 2);
    let item_recs = ItemBasedRecommender::new(store.clone(), similarity_for(SimilarityMetric::Euclidean));

    for user in store.user_ids() {
        let rated = store.user_ratings(user);
        for rec in user_recs.recommend(user, 10).unwrap() {
            assert!(!rated.contains_key(&rec.item_id));
        }
        for rec in item_recs.recommend(user, 10).unwrap() {
            assert!(!rated.contains_key(&rec.item_id));
        }
        for item in store.item_ids() {
            for rec in item_recs.recommended_because(user, item, 10).unwrap() {
                assert!(!rated.contains_key(&rec.item_id));
                assert_ne!(rec.item_id, item);
            }
        }
    }
}

#[test]
fn test_recommend_is_idempotent() {
    let recommender = user_based(demo_store(), SimilarityMetric::Pearson, 3);
    for user in 0..5 {
        assert_eq!(
            recommender.recommend(user, 3).unwrap(),
            recommender.recommend(user, 3).unwrap()
        );
    }
}

#[test]
fn test_empty_store_is_unknown_entity() {
    let store = Arc::new(RatingStore::new());
    let recommender = user_based(store.clone(), SimilarityMetric::Euclidean, 2);
    assert_eq!(
        recommender.recommend(0, 3),
        Err(RecommendError::unknown_user(0))
    );

    let items = ItemBasedRecommender::new(store, similarity_for(SimilarityMetric::Pearson));
    assert_eq!(
        items.recommended_because(0, 0, 3),
        Err(RecommendError::unknown_user(0))
    );
}

#[test]
fn test_user_without_overlap_gets_empty_recommendations() {
    let store = Arc::new(
        RatingStore::from_ratings(vec![(0, 0, 4.0), (1, 1, 3.0), (1, 2, 5.0), (2, 1, 2.0)]).unwrap(),
    );
    let recommender = user_based(store, SimilarityMetric::Euclidean, 2);
    assert_eq!(recommender.recommend(0, 3).unwrap(), vec![]);
}

#[test]
fn test_item_based_because_of_item_demo() {
    let store = demo_store();

    // With Pearson every remaining item is either degenerate or already rated.
    let pearson = ItemBasedRecommender::new(store.clone(), similarity_for(SimilarityMetric::Pearson));
    assert!(pearson.recommended_because(1, 5, 2).unwrap().is_empty());

    let euclidean = ItemBasedRecommender::new(store, similarity_for(SimilarityMetric::Euclidean));
    let recs = euclidean.recommended_because(1, 5, 2).unwrap();
    let ids: Vec<i64> = recs.iter().map(|r| r.item_id).collect();
    assert_eq!(ids, vec![4, 6]);
    assert!((recs[0].value - 1.0 / 3.0).abs() < 1e-9);
    assert!((recs[1].value - 0.25).abs() < 1e-9);
}

#[test]
fn test_item_based_unknown_seed_item() {
    let recommender = ItemBasedRecommender::new(demo_store(), similarity_for(SimilarityMetric::Euclidean));
    assert_eq!(
        recommender.recommended_because(1, 42, 2),
        Err(RecommendError::unknown_item(42))
    );
}

#[test]
fn test_most_similar_items() {
    let recommender = ItemBasedRecommender::new(demo_store(), similarity_for(SimilarityMetric::Euclidean));
    let similar = recommender.most_similar_items(5, 7).unwrap();
    assert!(similar.iter().all(|n| n.peer_id != 5));
    assert_eq!(similar.len(), 6);
}

#[test]
fn test_estimate_preference() {
    let store = demo_store();
    let recommender = user_based(store.clone(), SimilarityMetric::Euclidean, 2);

    assert_eq!(recommender.estimate_preference(1, 1).unwrap(), Some(5.0));
    let estimate = recommender.estimate_preference(1, 4).unwrap().unwrap();
    assert!((estimate - 3.0).abs() < 1e-9);
    assert_eq!(
        recommender.estimate_preference(9, 1),
        Err(RecommendError::unknown_user(9))
    );

    let items = ItemBasedRecommender::new(store, similarity_for(SimilarityMetric::Euclidean));
    assert_eq!(items.estimate_preference(0, 0).unwrap(), Some(3.0));
    let predicted = items.estimate_preference(1, 0).unwrap().unwrap();
    assert!((0.0..=5.0).contains(&predicted));
}

#[test]
fn test_threshold_neighborhood_drops_weak_neighbors() {
    let recommender = UserBasedRecommender::new(
        demo_store(),
        similarity_for(SimilarityMetric::Euclidean),
        NeighborhoodStrategy::Threshold { min_similarity: 0.2 },
    );
    let neighbors = recommender.neighborhood(1, Deadline::none()).unwrap();
    let ids: Vec<i64> = neighbors.iter().map(|n| n.peer_id).collect();
    assert_eq!(ids, vec![4]);
}

#[test]
fn test_expired_deadline_abandons_query() {
    let recommender = user_based(demo_store(), SimilarityMetric::Euclidean, 2);
    let result = recommender.recommend_until(1, 3, Deadline::at(Instant::now()));
    assert_eq!(result, Err(RecommendError::DeadlineExceeded));
}

#[test]
fn test_config_strategy_applies_threshold() {
    let config = RecommenderConfig {
        neighborhood_size: 3,
        similarity_threshold: Some(0.2),
        ..RecommenderConfig::default()
    };
    assert_eq!(
        NeighborhoodStrategy::from_config(&config),
        NeighborhoodStrategy::NearestN {
            n: 3,
            min_similarity: Some(0.2)
        }
    );
}
