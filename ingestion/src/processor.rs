use crate::format::parse_ratings;
use crate::source::read_rating_log;
use cfrec_core::error::{CodedError, ErrorCode};
use cfrec_core::ingest::IngestReport;
use cfrec_core::metrics::MetricsCollector;
use std::path::Path;
use storage::RatingStore;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid UTF-8 content")]
    InvalidUtf8,
}

impl CodedError for IngestionError {
    fn error_code(&self) -> ErrorCode {
        match self {
            IngestionError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                ErrorCode::NotFound
            }
            IngestionError::Io(_) => ErrorCode::Internal,
            IngestionError::InvalidUtf8 => ErrorCode::InvalidArgument,
        }
    }
}

/// Turns rating-log text into store contents.
///
/// Malformed lines and out-of-range ratings are both skipped and reported with
/// their line number; only I/O failures abort a load.
#[derive(Default)]
pub struct IngestionPipeline {
    metrics: Option<MetricsCollector>,
}

impl IngestionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn ingest_text(&self, store: &mut RatingStore, text: &str) -> IngestReport {
        let mut report = IngestReport::default();

        for (line, parsed) in parse_ratings(text) {
            let outcome = parsed
                .map_err(|e| e.to_string())
                .and_then(|r| store.put(r.user_id, r.item_id, r.value).map_err(|e| e.to_string()));

            match outcome {
                Ok(()) => report.accept(),
                Err(reason) => {
                    warn!("Skipping line {}: {}", line, reason);
                    report.reject(line, reason);
                }
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_ingestion(report.accepted, report.skipped);
        }
        report
    }

    pub async fn ingest_file(
        &self,
        store: &mut RatingStore,
        path: impl AsRef<Path>,
    ) -> Result<IngestReport, IngestionError> {
        let path = path.as_ref();
        let text = read_rating_log(path).await?;
        let report = self.ingest_text(store, &text);
        info!(
            "Loaded {} ratings from {} ({} skipped)",
            report.accepted,
            path.display(),
            report.skipped
        );
        Ok(report)
    }

    /// Build a fresh store from a rating log.
    pub async fn load_store(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<(RatingStore, IngestReport), IngestionError> {
        let mut store = RatingStore::new();
        let report = self.ingest_file(&mut store, path).await?;
        Ok((store, report))
    }
}
