use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct RequestMetrics {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub latencies: VecDeque<u64>, // microseconds
}

#[derive(Debug, Clone, Default)]
pub struct SimilarityMetrics {
    pub cache_hits: u64,
    pub cache_misses: u64,
}

#[derive(Debug, Clone, Default)]
pub struct IngestionMetrics {
    pub accepted: u64,
    pub skipped: u64,
}

#[derive(Clone)]
pub struct MetricsCollector {
    state: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    requests: RequestMetrics,
    similarity: SimilarityMetrics,
    ingestion: IngestionMetrics,
    max_history: usize,
}

impl MetricsCollector {
    pub fn new(max_history: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MetricsState {
                requests: RequestMetrics::default(),
                similarity: SimilarityMetrics::default(),
                ingestion: IngestionMetrics::default(),
                max_history,
            })),
        }
    }

    // Counters stay usable even if a recording thread panicked mid-update.
    fn lock(&self) -> MutexGuard<'_, MetricsState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record_request(&self, latency_us: u64, succeeded: bool) {
        let mut state = self.lock();
        state.requests.total_requests += 1;
        if !succeeded {
            state.requests.failed_requests += 1;
        }
        state.requests.latencies.push_back(latency_us);
        if state.requests.latencies.len() > state.max_history {
            state.requests.latencies.pop_front();
        }
    }

    /// Overwrites the cache counters with the cache's own running totals.
    pub fn set_similarity_cache(&self, hits: u64, misses: u64) {
        let mut state = self.lock();
        state.similarity.cache_hits = hits;
        state.similarity.cache_misses = misses;
    }

    pub fn record_ingestion(&self, accepted: usize, skipped: usize) {
        let mut state = self.lock();
        state.ingestion.accepted += accepted as u64;
        state.ingestion.skipped += skipped as u64;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.lock();
        let r = &state.requests;
        let s = &state.similarity;

        let mut sorted_latencies: Vec<u64> = r.latencies.iter().copied().collect();
        sorted_latencies.sort_unstable();

        let p50 = percentile(&sorted_latencies, 50.0);
        let p95 = percentile(&sorted_latencies, 95.0);
        let p99 = percentile(&sorted_latencies, 99.0);

        let lookups = s.cache_hits + s.cache_misses;
        let cache_hit_rate = if lookups > 0 {
            s.cache_hits as f32 / lookups as f32
        } else {
            0.0
        };

        MetricsSnapshot {
            total_requests: r.total_requests,
            failed_requests: r.failed_requests,
            p50,
            p95,
            p99,
            history_count: r.latencies.len(),
            cache_hit_rate,
            ingested_ratings: state.ingestion.accepted,
            skipped_ratings: state.ingestion.skipped,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new(1024)
    }
}

fn percentile(sorted: &[u64], p: f32) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((p / 100.0) * (sorted.len() as f32)).ceil() as usize;
    sorted[idx.saturating_sub(1).min(sorted.len() - 1)]
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub history_count: usize,
    pub cache_hit_rate: f32,
    pub ingested_ratings: u64,
    pub skipped_ratings: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_are_monotonic() {
        let metrics = MetricsCollector::new(100);
        for latency in 1..=20 {
            metrics.record_request(latency * 10, latency % 5 != 0);
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 20);
        assert_eq!(snapshot.failed_requests, 4);
        assert_eq!(snapshot.p50, 100);
        assert!(snapshot.p95 >= snapshot.p50);
        assert!(snapshot.p99 >= snapshot.p95);
    }

    #[test]
    fn history_is_bounded() {
        let metrics = MetricsCollector::new(3);
        for latency in 0..10 {
            metrics.record_request(latency, true);
        }
        assert_eq!(metrics.snapshot().history_count, 3);
    }

    #[test]
    fn cache_hit_rate_and_ingestion_totals() {
        let metrics = MetricsCollector::default();
        metrics.set_similarity_cache(3, 1);
        metrics.record_ingestion(10, 2);
        metrics.record_ingestion(5, 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_hit_rate, 0.75);
        assert_eq!(snapshot.ingested_ratings, 15);
        assert_eq!(snapshot.skipped_ratings, 2);
    }
}
