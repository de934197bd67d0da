use cfrec_core::error::{CodedError, ErrorCode};
use cfrec_core::model::EntityKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecommendError {
    #[error("unknown {kind}: {id}")]
    UnknownEntity { kind: EntityKind, id: i64 },
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl RecommendError {
    pub fn unknown_user(id: i64) -> Self {
        Self::UnknownEntity {
            kind: EntityKind::User,
            id,
        }
    }

    pub fn unknown_item(id: i64) -> Self {
        Self::UnknownEntity {
            kind: EntityKind::Item,
            id,
        }
    }
}

impl CodedError for RecommendError {
    fn error_code(&self) -> ErrorCode {
        match self {
            RecommendError::UnknownEntity { .. } => ErrorCode::NotFound,
            RecommendError::DeadlineExceeded => ErrorCode::DeadlineExceeded,
        }
    }
}
