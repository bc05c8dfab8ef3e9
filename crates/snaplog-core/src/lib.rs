//! Snaplog Core Library
//!
//! Rebuilds a complete dataset from a git history of rolling JSON snapshots:
//! replays every committed snapshot oldest first, keeps the newest version of
//! each record, optionally joins per-record detail documents, filters by date
//! and writes JSON, JSON Lines or Parquet.

pub mod domain;
pub mod enrich;
pub mod export;
pub mod filter;
pub mod git;
pub mod history;
pub mod merge;
pub mod metrics;
pub mod normalize;
pub mod obs;
pub mod pipeline;
pub mod telemetry;

pub use domain::{
    CanonicalRecord, CoordinateParseFailure, DetailEntry, DetailFields, MalformedSnapshot,
    RecordRejection, Result, SnaplogError,
};

pub use enrich::{
    enrich_records, lookup_detail, parse_detail_document, DetailArchive, DetailLedger,
    DetailOutcome, DetailStatus, FsDetailArchive, MemoryDetailArchive,
};
pub use export::{
    records_digest, write_to_path, ColumnKind, ExportColumn, ExportSchema, OutputFormat,
    RecordWriter,
};
pub use filter::{apply_date_range, parse_event_datetime, DateRange};
pub use git::{is_git_repo, Revision};
pub use history::{GitSnapshotLog, LogEntry, MemorySnapshotLog, Snapshot, SnapshotSource};
pub use merge::{merge_history, CanonicalSet};
pub use metrics::RunStats;
pub use normalize::{normalize_entry, parse_coordinates, NormalizedRecord};
pub use obs::ExportSpan;
pub use pipeline::{run_export, run_export_with, ExportConfig, ExportReport};
pub use telemetry::{init_tracing, level_for};

/// Snaplog version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
