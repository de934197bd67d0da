use cfrec_core::error::{CodedError, ErrorCode};
use cfrec_core::ingest::IngestReport;
use cfrec_core::model::{ItemId, UserId};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Preference values keyed by the opposite entity's id, in ascending id order.
pub type Preferences = BTreeMap<i64, f32>;

static NO_PREFERENCES: Preferences = BTreeMap::new();

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("invalid rating (user {user_id}, item {item_id}, value {value}): {reason}")]
    InvalidRating {
        user_id: UserId,
        item_id: ItemId,
        value: f32,
        reason: &'static str,
    },
}

impl CodedError for StoreError {
    fn error_code(&self) -> ErrorCode {
        match self {
            StoreError::InvalidRating { .. } => ErrorCode::InvalidArgument,
        }
    }
}

/// In-memory sparse ratings matrix with a user-indexed and an item-indexed view.
///
/// Both views are updated together on every `put`, so a rating reachable from
/// one is always reachable from the other. Ordered maps give ascending id
/// iteration everywhere, which keeps similarity sums and rankings reproducible.
/// The store is filled once and then shared read-only (usually behind an `Arc`).
#[derive(Debug, Clone, Default)]
pub struct RatingStore {
    by_user: BTreeMap<UserId, Preferences>,
    by_item: BTreeMap<ItemId, Preferences>,
    num_ratings: usize,
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(user, item, value)` triples, failing on the first
    /// invalid one.
    pub fn from_ratings<I>(ratings: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (UserId, ItemId, f32)>,
    {
        let mut store = Self::new();
        for (user_id, item_id, value) in ratings {
            store.put(user_id, item_id, value)?;
        }
        Ok(store)
    }

    /// Insert or overwrite the preference of `user_id` for `item_id`.
    pub fn put(&mut self, user_id: UserId, item_id: ItemId, value: f32) -> Result<(), StoreError> {
        validate(user_id, item_id, value)?;

        let previous = self
            .by_user
            .entry(user_id)
            .or_default()
            .insert(item_id, value);
        self.by_item.entry(item_id).or_default().insert(user_id, value);

        if previous.is_none() {
            self.num_ratings += 1;
        }
        Ok(())
    }

    /// Load a parsed batch of `(user, item, value)` triples. Invalid ratings
    /// are skipped and counted; the rest of the batch is still applied.
    pub fn ingest<I>(&mut self, ratings: I) -> IngestReport
    where
        I: IntoIterator<Item = (UserId, ItemId, f32)>,
    {
        let mut report = IngestReport::default();
        for (idx, (user_id, item_id, value)) in ratings.into_iter().enumerate() {
            match self.put(user_id, item_id, value) {
                Ok(()) => report.accept(),
                Err(e) => {
                    warn!("Skipping record {}: {}", idx + 1, e);
                    report.reject(idx + 1, e.to_string());
                }
            }
        }
        debug!(
            accepted = report.accepted,
            skipped = report.skipped,
            "Ingested rating batch"
        );
        report
    }

    /// Items rated by `user_id`. Unknown users have no ratings.
    pub fn user_ratings(&self, user_id: UserId) -> &Preferences {
        self.by_user.get(&user_id).unwrap_or(&NO_PREFERENCES)
    }

    /// Users who rated `item_id`. Unknown items have no ratings.
    pub fn item_ratings(&self, item_id: ItemId) -> &Preferences {
        self.by_item.get(&item_id).unwrap_or(&NO_PREFERENCES)
    }

    pub fn preference(&self, user_id: UserId, item_id: ItemId) -> Option<f32> {
        self.by_user
            .get(&user_id)
            .and_then(|prefs| prefs.get(&item_id))
            .copied()
    }

    /// Known user ids in ascending order. Clone the iterator to restart it.
    pub fn user_ids(&self) -> impl Iterator<Item = UserId> + Clone + '_ {
        self.by_user.keys().copied()
    }

    /// Known item ids in ascending order. Clone the iterator to restart it.
    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + Clone + '_ {
        self.by_item.keys().copied()
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.by_user.contains_key(&user_id)
    }

    pub fn contains_item(&self, item_id: ItemId) -> bool {
        self.by_item.contains_key(&item_id)
    }

    pub fn num_users(&self) -> usize {
        self.by_user.len()
    }

    pub fn num_items(&self) -> usize {
        self.by_item.len()
    }

    pub fn num_ratings(&self) -> usize {
        self.num_ratings
    }

    pub fn is_empty(&self) -> bool {
        self.num_ratings == 0
    }

    /// Smallest and largest stored preference, if any.
    pub fn preference_range(&self) -> Option<(f32, f32)> {
        self.by_user
            .values()
            .flat_map(|prefs| prefs.values().copied())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    pub fn max_preference(&self) -> Option<f32> {
        self.preference_range().map(|(_, hi)| hi)
    }

    pub fn min_preference(&self) -> Option<f32> {
        self.preference_range().map(|(lo, _)| lo)
    }
}

fn validate(user_id: UserId, item_id: ItemId, value: f32) -> Result<(), StoreError> {
    let reason = if user_id < 0 {
        "negative user id"
    } else if item_id < 0 {
        "negative item id"
    } else if !value.is_finite() {
        "value is not finite"
    } else if value < 0.0 {
        "negative value"
    } else {
        return Ok(());
    };

    Err(StoreError::InvalidRating {
        user_id,
        item_id,
        value,
        reason,
    })
}
