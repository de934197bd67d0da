use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::debug;

/// Similarity strategy used for user/user or item/item comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// `1 / (1 + d)` where `d` is the Euclidean distance over co-rated entries.
    Euclidean,
    /// Pearson correlation over co-rated entries.
    Pearson,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub ratings_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            ratings_path: "data/ratings.csv".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RecommenderConfig {
    pub user_similarity: SimilarityMetric,
    pub item_similarity: SimilarityMetric,
    /// Number of nearest users consulted by the user-based recommender.
    pub neighborhood_size: usize,
    /// When set, neighbors below this similarity are dropped.
    pub similarity_threshold: Option<f64>,
    /// Default number of recommendations per user.
    pub how_many: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            user_similarity: SimilarityMetric::Euclidean,
            item_similarity: SimilarityMetric::Pearson,
            neighborhood_size: 2,
            similarity_threshold: None,
            how_many: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 100_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BatchConfig {
    pub workers: usize,
    pub request_timeout_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            request_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub recommender: RecommenderConfig,
    pub cache: CacheConfig,
    pub batch: BatchConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Layers `<dir>/default`, `<dir>/<RUN_MODE>` and `CFREC_*` environment
    /// variables (nested keys separated by `__`).
    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name(&dir.join("default").to_string_lossy()))
            .add_source(
                File::with_name(&dir.join(&run_mode).to_string_lossy()).required(false),
            )
            .add_source(Environment::with_prefix("CFREC").separator("__"));

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        debug!("Loaded configuration from {} (run mode {})", dir.display(), run_mode);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recommender.neighborhood_size == 0 {
            return Err(ConfigError::Message(
                "recommender.neighborhood_size must be at least 1".into(),
            ));
        }
        if let Some(threshold) = self.recommender.similarity_threshold {
            if !(-1.0..=1.0).contains(&threshold) {
                return Err(ConfigError::Message(format!(
                    "recommender.similarity_threshold must lie in [-1, 1], got {}",
                    threshold
                )));
            }
        }
        if self.batch.workers == 0 {
            return Err(ConfigError::Message(
                "batch.workers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
