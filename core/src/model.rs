use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = i64;
pub type ItemId = i64;

/// Which side of the ratings matrix an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Item,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => write!(f, "user"),
            EntityKind::Item => write!(f, "item"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub value: f32,
}

impl Rating {
    pub fn new(user_id: UserId, item_id: ItemId, value: f32) -> Self {
        Self {
            user_id,
            item_id,
            value,
        }
    }
}

impl From<(UserId, ItemId, f32)> for Rating {
    fn from((user_id, item_id, value): (UserId, ItemId, f32)) -> Self {
        Self::new(user_id, item_id, value)
    }
}

/// A peer in a neighborhood together with its similarity to the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub peer_id: i64,
    pub similarity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    /// Predicted preference, or similarity to the seed item for
    /// "because of" recommendations.
    pub value: f64,
}

impl Recommendation {
    pub fn new(item_id: ItemId, value: f64) -> Self {
        Self { item_id, value }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecommendedItem[item:{}, value:{}]", self.item_id, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommendation_display_names_item_and_value() {
        let rec = Recommendation::new(6, 3.5);
        assert_eq!(rec.to_string(), "RecommendedItem[item:6, value:3.5]");
    }

    #[test]
    fn entity_kind_serializes_snake_case() {
        let json = serde_json::to_string(&EntityKind::Item).unwrap();
        assert_eq!(json, "\"item\"");
    }
}
