//! Line-oriented rating log: `userId,itemId,value`, comma or tab separated.

use cfrec_core::error::{CodedError, ErrorCode};
use cfrec_core::model::Rating;
use thiserror::Error;

pub const COMMENT_PREFIX: char = '#';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("expected 3 fields, found {0}")]
    FieldCount(usize),
    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),
    #[error("invalid item id: {0:?}")]
    InvalidItemId(String),
    #[error("invalid preference value: {0:?}")]
    InvalidValue(String),
}

impl CodedError for FormatError {
    fn error_code(&self) -> ErrorCode {
        ErrorCode::InvalidArgument
    }
}

/// Parse one log line. Blank lines and `#` comments yield `Ok(None)`.
///
/// The separator is chosen per line: a comma if present, otherwise a tab.
/// Range checks (negative ids or values) belong to the store, not the parser.
pub fn parse_line(line: &str) -> Result<Option<Rating>, FormatError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
        return Ok(None);
    }

    let separator = if line.contains(',') { ',' } else { '\t' };
    let fields: Vec<&str> = line.split(separator).map(str::trim).collect();
    if fields.len() != 3 {
        return Err(FormatError::FieldCount(fields.len()));
    }

    let user_id = fields[0]
        .parse::<i64>()
        .map_err(|_| FormatError::InvalidUserId(fields[0].to_string()))?;
    let item_id = fields[1]
        .parse::<i64>()
        .map_err(|_| FormatError::InvalidItemId(fields[1].to_string()))?;
    let value = fields[2]
        .parse::<f32>()
        .map_err(|_| FormatError::InvalidValue(fields[2].to_string()))?;

    Ok(Some(Rating::new(user_id, item_id, value)))
}

/// Parse a whole log, yielding `(line_number, result)` for every non-blank,
/// non-comment line. Line numbers are 1-based.
pub fn parse_ratings(text: &str) -> impl Iterator<Item = (usize, Result<Rating, FormatError>)> + '_ {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| parse_line(line).transpose().map(|res| (idx + 1, res)))
}

pub fn format_rating(rating: &Rating) -> String {
    format!("{},{},{}", rating.user_id, rating.item_id, rating.value)
}
