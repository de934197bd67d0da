use serde::{Deserialize, Serialize};

/// A record that was dropped during ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// 1-based line number for text input, 1-based position for parsed batches.
    pub position: usize,
    pub reason: String,
}

/// Outcome of a batch ingestion. Invalid records never abort the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub accepted: usize,
    pub skipped: usize,
    pub rejected: Vec<RejectedRecord>,
}

impl IngestReport {
    pub fn accept(&mut self) {
        self.accepted += 1;
    }

    pub fn reject(&mut self, position: usize, reason: impl Into<String>) {
        self.skipped += 1;
        self.rejected.push(RejectedRecord {
            position,
            reason: reason.into(),
        });
    }

    pub fn merge(&mut self, other: IngestReport) {
        self.accepted += other.accepted;
        self.skipped += other.skipped;
        self.rejected.extend(other.rejected);
    }

    pub fn total(&self) -> usize {
        self.accepted + self.skipped
    }
}
