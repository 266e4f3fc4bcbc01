//! Error types for Score Drift.

use thiserror::Error;

/// Result type alias for Score Drift operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Score Drift.
///
/// Field-level data problems never show up here: an unparseable score is
/// absorbed as a missing value (see [`ScoreParseFailure`]). Everything in this
/// enum aborts the batch being processed.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    // Source errors (20-29)
    #[error("batch {index} is unavailable: {reason}")]
    BatchUnavailable { index: u64, reason: String },

    #[error("malformed record in batch {index}: {detail}")]
    MalformedRecord { index: u64, detail: String },

    #[error("batch {got} processed out of order (expected {expected})")]
    OutOfOrder { expected: u64, got: u64 },

    // Sink errors (40-49)
    #[error("failed to write table {table}: {source}")]
    WriteFailure {
        table: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read table {table}: {detail}")]
    TableRead { table: String, detail: String },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::BatchUnavailable { .. } => 20,
            Error::MalformedRecord { .. } => 21,
            Error::OutOfOrder { .. } => 22,
            Error::WriteFailure { .. } => 40,
            Error::TableRead { .. } => 41,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Shorthand for a structural problem in batch `index`.
    pub fn malformed(index: u64, detail: impl Into<String>) -> Self {
        Error::MalformedRecord {
            index,
            detail: detail.into(),
        }
    }
}

/// A score field that could not be read as a finite number.
///
/// Recovered locally by the loader, which substitutes a missing score.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("unparseable score {raw:?}")]
pub struct ScoreParseFailure {
    pub raw: String,
}
