use crate::queue::Job;
use crate::worker::execute;
use cfrec_core::config::BatchConfig;
use cfrec_core::error::{CodedError, ErrorCode};
use cfrec_core::model::{Recommendation, UserId};
use recommend::{Deadline, RecommendError, RecommenderEngine};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("worker pool closed")]
    Closed,
}

impl CodedError for BatchError {
    fn error_code(&self) -> ErrorCode {
        ErrorCode::Internal
    }
}

/// Per-user outcome of a batch, keyed (and therefore ordered) by user id.
#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchReport {
    pub recommendations: BTreeMap<UserId, Vec<Recommendation>>,
    pub failures: BTreeMap<UserId, String>,
    pub timed_out: usize,
}

impl BatchReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Runs `recommend_for_user` for every known user on a bounded set of
/// blocking tasks. Each task reads the shared store and returns its own
/// `(user, outcome)` slot; nothing is shared mutably.
pub struct BatchRunner {
    engine: Arc<RecommenderEngine>,
    workers: usize,
    request_timeout: Duration,
}

impl BatchRunner {
    pub fn new(engine: Arc<RecommenderEngine>, config: &BatchConfig) -> Self {
        Self {
            engine,
            workers: config.workers.max(1),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }

    pub async fn recommend_all_users(&self, how_many: usize) -> Result<BatchReport, BatchError> {
        let user_ids: Vec<UserId> = self.engine.store().user_ids().collect();
        info!(
            "Batch started: {} users, {} workers",
            user_ids.len(),
            self.workers
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for user_id in user_ids {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| BatchError::Closed)?;
            let engine = self.engine.clone();
            let timeout = self.request_timeout;

            tasks.spawn_blocking(move || {
                let _permit = permit;
                let job = Job::RecommendForUser { user_id, how_many };
                (user_id, execute(&engine, &job, Deadline::after(timeout)))
            });
        }

        let mut report = BatchReport::default();
        while let Some(joined) = tasks.join_next().await {
            let (user_id, outcome) = joined?;
            match outcome {
                Ok(recs) => {
                    report.recommendations.insert(user_id, recs);
                }
                Err(e) => {
                    if e == RecommendError::DeadlineExceeded {
                        report.timed_out += 1;
                    }
                    warn!("Batch request for user {} failed: {}", user_id, e);
                    report.failures.insert(user_id, e.to_string());
                }
            }
        }

        info!(
            "Batch finished: {} succeeded, {} failed ({} timed out)",
            report.recommendations.len(),
            report.failures.len(),
            report.timed_out
        );
        Ok(report)
    }
}
