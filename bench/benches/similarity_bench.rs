use cfrec_bench::synthetic_store;
use cfrec_core::config::SimilarityMetric;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use recommend::similarity_for;

pub fn similarity_benchmark(c: &mut Criterion) {
    let store = synthetic_store(500, 2_000, 0.05, 42);

    for metric in [SimilarityMetric::Euclidean, SimilarityMetric::Pearson] {
        let measure = similarity_for(metric);
        c.bench_function(&format!("user_similarity {:?}", metric), |b| {
            b.iter(|| measure.user_similarity(&store, black_box(1), black_box(2)))
        });
        c.bench_function(&format!("item_similarity {:?}", metric), |b| {
            b.iter(|| measure.item_similarity(&store, black_box(10), black_box(20)))
        });
    }
}

criterion_group!(benches, similarity_benchmark);
criterion_main!(benches);
