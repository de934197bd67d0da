use crate::format::format_rating;
use crate::processor::IngestionError;
use cfrec_core::model::Rating;
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

/// Read a rating log into memory.
pub async fn read_rating_log(path: impl AsRef<Path>) -> Result<String, IngestionError> {
    let bytes = fs::read(path.as_ref()).await?;
    String::from_utf8(bytes).map_err(|_| IngestionError::InvalidUtf8)
}

/// Write ratings as a log, one record per line, replacing any existing file.
pub async fn write_rating_log(
    path: impl AsRef<Path>,
    ratings: &[Rating],
) -> Result<(), IngestionError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let file = fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    for rating in ratings {
        writer.write_all(format_rating(rating).as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    writer.flush().await?;

    info!("Wrote {} ratings to {}", ratings.len(), path.display());
    Ok(())
}

/// Flatten a dense matrix (rows are users, columns are items) into ratings.
/// Cells that are zero or negative mean "not rated".
pub fn dense_to_ratings(matrix: &[Vec<f32>]) -> Vec<Rating> {
    matrix
        .iter()
        .enumerate()
        .flat_map(|(user, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, value)| **value > 0.0)
                .map(move |(item, value)| Rating::new(user as i64, item as i64, *value))
        })
        .collect()
}

/// Write a dense matrix as a rating log. Returns the number of records written.
pub async fn write_dense_matrix(
    path: impl AsRef<Path>,
    matrix: &[Vec<f32>],
) -> Result<usize, IngestionError> {
    let ratings = dense_to_ratings(matrix);
    write_rating_log(path, &ratings).await?;
    Ok(ratings.len())
}
