use cfrec_bench::synthetic_store;
use cfrec_core::config::{CacheConfig, RecommenderConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use recommend::RecommenderEngine;
use std::sync::Arc;

pub fn recommend_benchmark(c: &mut Criterion) {
    let store = Arc::new(synthetic_store(300, 500, 0.05, 42));
    let config = RecommenderConfig {
        neighborhood_size: 10,
        ..RecommenderConfig::default()
    };

    let plain = RecommenderEngine::new(store.clone(), &config);
    c.bench_function("recommend_for_user uncached", |b| {
        b.iter(|| plain.recommend_for_user(black_box(7), 10))
    });

    let cached = RecommenderEngine::with_cache(store, &config, &CacheConfig::default());
    c.bench_function("recommend_for_user cached", |b| {
        b.iter(|| cached.recommend_for_user(black_box(7), 10))
    });

    c.bench_function("recommend_because_of_item", |b| {
        b.iter(|| cached.recommend_because_of_item(black_box(7), black_box(3), 10))
    });
}

criterion_group!(benches, recommend_benchmark);
criterion_main!(benches);
