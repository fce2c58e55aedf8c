//! Counter record and store error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One row of the counter table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    /// Partition key.
    pub path: String,
    /// Number of recorded visits.
    pub hits: u64,
}

/// Errors that can occur during counter store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store cannot serve requests right now.
    #[error("counter store unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the snapshot file failed.
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot file contents could not be (de)serialized.
    #[error("snapshot format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result type for counter store operations.
pub type StoreResult<T> = Result<T, StoreError>;
