//! Error taxonomy for snapshot replay and export.
//!
//! [`SnaplogError`] carries the fatal conditions that stop a run. The other
//! types in this module describe per-item anomalies: they are counted in
//! [`crate::RunStats`] and logged, never propagated.

use std::path::PathBuf;

use chrono::NaiveDate;

/// Fatal errors: the run cannot produce a structurally valid artifact.
#[derive(Debug, thiserror::Error)]
pub enum SnaplogError {
    #[error("history access error: {0}")]
    HistoryAccess(String),

    #[error("unsupported output format {extension:?} (expected .json, .jsonl, .ndjson or .parquet)")]
    UnsupportedFormat { extension: String },

    #[error("detail archive not found: {0:?}")]
    DetailArchiveMissing(PathBuf),

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("columnar write error: {0}")]
    Columnar(#[from] polars::error::PolarsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for snaplog operations.
pub type Result<T> = std::result::Result<T, SnaplogError>;

/// A snapshot revision whose content could not be used. The traversal skips it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed snapshot at {revision}: {reason}")]
pub struct MalformedSnapshot {
    pub revision: String,
    pub reason: String,
}

/// Why a raw entry was dropped before reaching the merger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecordRejection {
    #[error("entry is not an object")]
    NotAnObject,

    #[error("entry has no identifier")]
    MissingIdentifier,

    #[error("entry has no timestamp")]
    MissingTimestamp,
}

/// A coordinate string that did not yield a valid latitude/longitude pair.
/// The record is kept with both coordinates absent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unusable coordinates {raw:?}: {reason}")]
pub struct CoordinateParseFailure {
    pub raw: String,
    pub reason: String,
}
