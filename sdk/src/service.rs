use cfrec_core::config::AppConfig;
use cfrec_core::error::{CodedError, ErrorCode};
use cfrec_core::ingest::IngestReport;
use cfrec_core::metrics::{MetricsCollector, MetricsSnapshot};
use cfrec_core::model::{ItemId, Recommendation, UserId};
use ingestion::{IngestionError, IngestionPipeline};
use jobs::{BatchError, BatchReport, BatchRunner};
use recommend::{Deadline, RecommendError, RecommenderEngine};
use std::sync::Arc;
use std::time::Duration;
use storage::RatingStore;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("ingestion error: {0}")]
    Ingestion(#[from] IngestionError),
    #[error("recommendation error: {0}")]
    Recommend(#[from] RecommendError),
    #[error("batch error: {0}")]
    Batch(#[from] BatchError),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CodedError for SdkError {
    fn error_code(&self) -> ErrorCode {
        match self {
            SdkError::Ingestion(e) => e.error_code(),
            SdkError::Recommend(e) => e.error_code(),
            SdkError::Batch(e) => e.error_code(),
            SdkError::Timeout(_) => ErrorCode::DeadlineExceeded,
            SdkError::Task(_) => ErrorCode::Internal,
        }
    }
}

#[async_trait::async_trait]
pub trait RecommendationClient: Send + Sync {
    async fn recommend_for_user(
        &self,
        user_id: UserId,
        how_many: usize,
    ) -> Result<Vec<Recommendation>, SdkError>;

    async fn recommend_because_of_item(
        &self,
        user_id: UserId,
        item_id: ItemId,
        how_many: usize,
    ) -> Result<Vec<Recommendation>, SdkError>;
}

/// Async front end over a loaded store.
///
/// Every request runs on the blocking pool under a per-request deadline taken
/// from `batch.request_timeout_ms`. A timed-out request is abandoned; the
/// store is read-only, so nothing needs rolling back.
pub struct RecommenderService {
    engine: Arc<RecommenderEngine>,
    config: AppConfig,
    ingest_report: IngestReport,
}

impl RecommenderService {
    /// Load `config.data.ratings_path` and build an engine over it.
    pub async fn open(config: AppConfig) -> Result<Self, SdkError> {
        let metrics = MetricsCollector::default();
        let pipeline = IngestionPipeline::new().with_metrics(metrics.clone());
        let (store, report) = pipeline.load_store(&config.data.ratings_path).await?;
        if report.skipped > 0 {
            warn!(
                "{} of {} records in {} were skipped",
                report.skipped,
                report.total(),
                config.data.ratings_path
            );
        }
        Ok(Self::build(store, config, report, metrics))
    }

    pub fn from_store(store: RatingStore, config: AppConfig) -> Self {
        Self::build(store, config, IngestReport::default(), MetricsCollector::default())
    }

    fn build(
        store: RatingStore,
        config: AppConfig,
        ingest_report: IngestReport,
        metrics: MetricsCollector,
    ) -> Self {
        let engine =
            RecommenderEngine::with_cache(Arc::new(store), &config.recommender, &config.cache)
                .with_metrics(metrics);
        info!("Recommender service ready");
        Self {
            engine: Arc::new(engine),
            config,
            ingest_report,
        }
    }

    pub fn engine(&self) -> &Arc<RecommenderEngine> {
        &self.engine
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn ingest_report(&self) -> &IngestReport {
        &self.ingest_report
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.engine.metrics()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.config.batch.request_timeout_ms)
    }

    pub async fn recommend_all_users(&self, how_many: usize) -> Result<BatchReport, SdkError> {
        let runner = BatchRunner::new(self.engine.clone(), &self.config.batch);
        Ok(runner.recommend_all_users(how_many).await?)
    }

    async fn run_with_deadline<F>(&self, query: F) -> Result<Vec<Recommendation>, SdkError>
    where
        F: FnOnce(&RecommenderEngine, Deadline) -> Result<Vec<Recommendation>, RecommendError>
            + Send
            + 'static,
    {
        let timeout = self.request_timeout();
        let engine = self.engine.clone();
        let task = tokio::task::spawn_blocking(move || query(&engine, Deadline::after(timeout)));

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => Ok(joined??),
            Err(_) => {
                warn!("Request abandoned after {:?}", timeout);
                Err(SdkError::Timeout(timeout))
            }
        }
    }
}

#[async_trait::async_trait]
impl RecommendationClient for RecommenderService {
    async fn recommend_for_user(
        &self,
        user_id: UserId,
        how_many: usize,
    ) -> Result<Vec<Recommendation>, SdkError> {
        self.run_with_deadline(move |engine, deadline| {
            engine.recommend_for_user_until(user_id, how_many, deadline)
        })
        .await
    }

    async fn recommend_because_of_item(
        &self,
        user_id: UserId,
        item_id: ItemId,
        how_many: usize,
    ) -> Result<Vec<Recommendation>, SdkError> {
        self.run_with_deadline(move |engine, deadline| {
            engine.recommend_because_of_item_until(user_id, item_id, how_many, deadline)
        })
        .await
    }
}
