use cfrec_core::config::AppConfig;
use cfrec_core::error::{CodedError, ErrorCode};
use cfrec_sdk::demo::demo_matrix;
use cfrec_sdk::{RecommendationClient, RecommenderService, SdkError};
use ingestion::source::write_dense_matrix;
use recommend::RecommendError;
use storage::RatingStore;
use tempfile::tempdir;

async fn demo_service(dir: &tempfile::TempDir) -> RecommenderService {
    let path = dir.path().join("ratings.csv");
    write_dense_matrix(&path, &demo_matrix()).await.unwrap();

    let mut config = AppConfig::default();
    config.data.ratings_path = path.to_string_lossy().into_owned();
    RecommenderService::open(config).await.unwrap()
}

#[tokio::test]
async fn test_open_loads_rating_log() {
    let dir = tempdir().unwrap();
    let service = demo_service(&dir).await;

    assert_eq!(service.ingest_report().accepted, 24);
    assert_eq!(service.engine().store().num_users(), 5);
    assert_eq!(service.metrics().ingested_ratings, 24);
}

#[tokio::test]
async fn test_recommend_through_client_trait() {
    let dir = tempdir().unwrap();
    let service = demo_service(&dir).await;
    let client: &dyn RecommendationClient = &service;

    let recs = client.recommend_for_user(1, 3).await.unwrap();
    let ids: Vec<i64> = recs.iter().map(|r| r.item_id).collect();
    assert_eq!(ids, vec![6, 0, 4]);

    let because = client.recommend_because_of_item(1, 5, 2).await.unwrap();
    assert!(because.is_empty());
}

#[tokio::test]
async fn test_unknown_user_surfaces_not_found() {
    let service = RecommenderService::from_store(RatingStore::new(), AppConfig::default());
    let err = service.recommend_for_user(0, 3).await.unwrap_err();

    assert!(matches!(
        err,
        SdkError::Recommend(RecommendError::UnknownEntity { id: 0, .. })
    ));
    assert_eq!(err.error_code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_zero_timeout_is_deadline_exceeded() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ratings.csv");
    write_dense_matrix(&path, &demo_matrix()).await.unwrap();

    let mut config = AppConfig::default();
    config.data.ratings_path = path.to_string_lossy().into_owned();
    config.batch.request_timeout_ms = 0;
    let service = RecommenderService::open(config).await.unwrap();

    let err = service.recommend_for_user(1, 3).await.unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::DeadlineExceeded);
}

#[tokio::test]
async fn test_missing_log_fails_open() {
    let dir = tempdir().unwrap();
    let mut config = AppConfig::default();
    config.data.ratings_path = dir.path().join("absent.csv").to_string_lossy().into_owned();

    let err = match RecommenderService::open(config).await {
        Err(e) => e,
        Ok(_) => panic!("Expected error for missing rating log"),
    };
    assert!(matches!(err, SdkError::Ingestion(_)));
    assert_eq!(err.error_code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_recommend_all_users() {
    let dir = tempdir().unwrap();
    let service = demo_service(&dir).await;

    let report = service.recommend_all_users(3).await.unwrap();
    assert_eq!(report.recommendations.len(), 5);
    for (user, recs) in &report.recommendations {
        let rated = service.engine().store().user_ratings(*user);
        assert!(recs.iter().all(|r| !rated.contains_key(&r.item_id)));
    }
}
