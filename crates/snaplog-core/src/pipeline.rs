//! End-to-end export run.
//!
//! History reader -> normalizer -> merger -> (optional) enricher -> date
//! filter -> writer, as one linear pass. Each stage owns the canonical set
//! while it works on it and hands it to the next by value.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::Result;
use crate::enrich::{enrich_records, DetailArchive, FsDetailArchive};
use crate::export::{records_digest, write_to_path, ExportSchema, OutputFormat};
use crate::filter::{apply_date_range, DateRange};
use crate::history::{GitSnapshotLog, SnapshotSource};
use crate::merge::merge_history;
use crate::metrics::RunStats;
use crate::obs::{self, ExportSpan};

/// Default tracked snapshot file inside the repository.
pub const DEFAULT_SNAPSHOT_FILE: &str = "events.json";

/// Default detail archive directory.
pub const DEFAULT_DETAIL_DIR: &str = "html";

/// Settings for one export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Work tree whose history holds the snapshots.
    pub repo_dir: PathBuf,
    /// Path of the snapshot file, relative to the work tree.
    pub snapshot_file: String,
    /// Destination; its extension selects the format.
    pub output: PathBuf,
    /// Detail archive directory, when enrichment is requested.
    pub detail_dir: Option<PathBuf>,
    /// Inclusive calendar-date bounds.
    pub date_range: DateRange,
}

impl ExportConfig {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: PathBuf::from("."),
            snapshot_file: DEFAULT_SNAPSHOT_FILE.to_string(),
            output: output.into(),
            detail_dir: None,
            date_range: DateRange::unbounded(),
        }
    }

    pub fn with_repo(mut self, repo_dir: impl Into<PathBuf>) -> Self {
        self.repo_dir = repo_dir.into();
        self
    }

    pub fn with_snapshot_file(mut self, file: impl Into<String>) -> Self {
        self.snapshot_file = file.into();
        self
    }

    pub fn with_details(mut self, detail_dir: impl Into<PathBuf>) -> Self {
        self.detail_dir = Some(detail_dir.into());
        self
    }

    /// Set the date bounds. Fails when `start` is after `end`.
    pub fn with_date_range(
        mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self> {
        self.date_range = DateRange::new(start, end)?;
        Ok(self)
    }

    pub fn includes_details(&self) -> bool {
        self.detail_dir.is_some()
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReport {
    pub output: PathBuf,
    pub format: String,
    pub bytes_written: u64,
    pub digest: String,
    pub duration_ms: u64,
    pub stats: RunStats,
}

/// Run the export described by `config` against its git repository.
///
/// Fatal conditions (unsupported format, missing detail archive, unreadable
/// history) are detected before anything is written.
pub fn run_export(config: &ExportConfig) -> Result<ExportReport> {
    OutputFormat::from_path(&config.output)?;
    let archive = match &config.detail_dir {
        Some(dir) => Some(FsDetailArchive::open(dir)?),
        None => None,
    };
    let mut history = GitSnapshotLog::open(&config.repo_dir, config.snapshot_file.clone())?;
    obs::emit_history_opened(history.file(), history.remaining_hint());

    run_export_with(
        &mut history,
        archive.as_ref().map(|a| a as &dyn DetailArchive),
        &config.date_range,
        &config.output,
    )
}

/// Run the export over any snapshot source and optional detail archive.
pub fn run_export_with(
    history: &mut dyn SnapshotSource,
    archive: Option<&dyn DetailArchive>,
    date_range: &DateRange,
    output: &Path,
) -> Result<ExportReport> {
    let started = Instant::now();
    let _span = ExportSpan::enter(output);
    let format = OutputFormat::from_path(output)?;
    let writer = format.writer();
    let schema = ExportSchema::new(archive.is_some());
    let mut stats = RunStats::new();

    let canonical = merge_history(history, &mut stats)?;
    let (canonical, ledger) = match archive {
        Some(archive) => {
            let (enriched, ledger) = enrich_records(canonical, archive);
            (enriched, Some(ledger))
        }
        None => (canonical, None),
    };
    let canonical = apply_date_range(canonical, date_range, &mut stats);
    if let Some(ledger) = &ledger {
        ledger.tally(&canonical, &mut stats);
    }

    let records = canonical.into_records();
    if records.is_empty() {
        warn!("no records left to export; writing an empty artifact");
    }

    let digest = records_digest(&records, &schema)?;
    let bytes_written = write_to_path(writer.as_ref(), &records, &schema, output)?;
    stats.records_written = records.len() as u64;
    obs::emit_export_written(format.name(), output, stats.records_written, bytes_written);

    if stats.anomalies() > 0 {
        info!(anomalies = stats.anomalies(), "recovered anomalies during run");
    }
    stats.flush();

    Ok(ExportReport {
        output: output.to_path_buf(),
        format: format.name().to_string(),
        bytes_written,
        digest,
        duration_ms: started.elapsed().as_millis() as u64,
        stats,
    })
}
