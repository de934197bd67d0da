pub mod demo;
pub mod service;

pub use service::{RecommendationClient, RecommenderService, SdkError};
