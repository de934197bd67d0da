use storage::RatingStore;

/// Deterministic sparse ratings for benchmarks: each user rates roughly
/// `density` of the items with values in 1..=5.
pub fn synthetic_store(users: i64, items: i64, density: f64, seed: u64) -> RatingStore {
    let mut state = seed.max(1);
    let mut next = move || {
        // xorshift64
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let threshold = (density.clamp(0.0, 1.0) * u64::MAX as f64) as u64;
    let mut ratings = Vec::new();
    for user in 0..users {
        for item in 0..items {
            if next() <= threshold {
                let value = (next() % 5 + 1) as f32;
                ratings.push((user, item, value));
            }
        }
    }

    let mut store = RatingStore::new();
    store.ingest(ratings);
    store
}
