use crate::queue::Job;
use cfrec_core::model::Recommendation;
use recommend::{Deadline, RecommendError, RecommenderEngine};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug)]
pub struct JobResult {
    pub job: Job,
    pub outcome: Result<Vec<Recommendation>, RecommendError>,
}

/// Consumes jobs from a channel and answers each on the result channel.
///
/// Each job runs on the blocking pool with its own deadline; the engine's
/// store is shared read-only, so jobs never contend on it.
pub struct Worker {
    receiver: mpsc::Receiver<Job>,
    results: mpsc::Sender<JobResult>,
    engine: Arc<RecommenderEngine>,
    request_timeout: Duration,
}

impl Worker {
    pub fn new(
        receiver: mpsc::Receiver<Job>,
        results: mpsc::Sender<JobResult>,
        engine: Arc<RecommenderEngine>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            receiver,
            results,
            engine,
            request_timeout,
        }
    }

    pub async fn run(mut self) {
        info!("Worker started");
        while let Some(job) = self.receiver.recv().await {
            let engine = self.engine.clone();
            let timeout = self.request_timeout;
            let task_job = job.clone();

            let outcome = match tokio::task::spawn_blocking(move || {
                execute(&engine, &task_job, Deadline::after(timeout))
            })
            .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Job {:?} panicked: {}", job, e);
                    continue;
                }
            };

            if let Err(e) = &outcome {
                warn!("Job {:?} failed: {}", job, e);
            }
            if self.results.send(JobResult { job, outcome }).await.is_err() {
                warn!("Result channel closed, stopping worker");
                break;
            }
        }
        info!("Worker stopped");
    }
}

pub(crate) fn execute(
    engine: &RecommenderEngine,
    job: &Job,
    deadline: Deadline,
) -> Result<Vec<Recommendation>, RecommendError> {
    match *job {
        Job::RecommendForUser { user_id, how_many } => {
            engine.recommend_for_user_until(user_id, how_many, deadline)
        }
        Job::RecommendBecauseOfItem {
            user_id,
            item_id,
            how_many,
        } => engine.recommend_because_of_item_until(user_id, item_id, how_many, deadline),
    }
}
