pub mod cache;
pub mod deadline;
pub mod engine;
pub mod error;
pub mod item_based;
pub mod neighborhood;
pub mod recommender;
pub mod similarity;
pub mod user_based;

pub use cache::CachingSimilarity;
pub use deadline::Deadline;
pub use engine::RecommenderEngine;
pub use error::RecommendError;
pub use item_based::ItemBasedRecommender;
pub use neighborhood::{nearest_n, NeighborhoodSelector, NeighborhoodStrategy};
pub use recommender::Recommender;
pub use similarity::{
    similarity_for, EuclideanDistance, InsufficientData, PearsonCorrelation, SimilarityMeasure,
};
pub use user_based::UserBasedRecommender;
