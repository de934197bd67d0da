use cfrec_core::config::{AppConfig, SimilarityMetric};
use cfrec_core::init_tracing;
use cfrec_sdk::demo::{demo_matrix, NEIGHBORHOOD_NUM, RECOMMENDER_NUM};
use cfrec_sdk::{RecommendationClient, RecommenderService};
use ingestion::source::write_dense_matrix;
use recommend::RecommenderEngine;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Falling back to built-in configuration: {}", e);
        AppConfig::default()
    });
    config.recommender.user_similarity = SimilarityMetric::Euclidean;
    config.recommender.item_similarity = SimilarityMetric::Pearson;
    config.recommender.neighborhood_size = NEIGHBORHOOD_NUM;

    let written = write_dense_matrix(&config.data.ratings_path, &demo_matrix()).await?;
    info!("Demo matrix written: {} ratings", written);

    let service = RecommenderService::open(config.clone()).await?;

    // User-based, Euclidean similarity, every user.
    let report = service.recommend_all_users(RECOMMENDER_NUM).await?;
    for (user, recs) in &report.recommendations {
        let line: Vec<String> = recs
            .iter()
            .map(|r| format!("{}[{}]", r.item_id, r.value))
            .collect();
        println!("user : {} {}", user, line.join(" "));
    }

    // Item-based, Pearson similarity.
    println!("Items similar to item 5 that user 1 has not rated (top 2):");
    for rec in service.recommend_because_of_item(1, 5, 2).await? {
        println!("{}", rec);
    }

    // User-based, Pearson similarity, user 1.
    let mut pearson = config.recommender.clone();
    pearson.user_similarity = SimilarityMetric::Pearson;
    let engine = RecommenderEngine::new(service.engine().store().clone(), &pearson);
    println!("Pearson user-based recommendations for user 1 (top 2):");
    for rec in engine.recommend_for_user(1, 2)? {
        println!("{}", rec);
    }

    info!("Metrics: {:?}", service.metrics());
    Ok(())
}
