pub mod store;

pub use store::{Preferences, RatingStore, StoreError};
