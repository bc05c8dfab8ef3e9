//! Structured observability hooks for the export pipeline.
//!
//! - Run-scoped tracing span via the [`ExportSpan`] RAII guard
//! - Emission functions for pipeline milestones: history opened, snapshot
//!   skipped, merge finished, enrichment finished, export written
//!
//! Verbosity follows `RUST_LOG`; pass `--json` to the CLI for JSON lines.

use std::path::Path;

use tracing::{info, warn};

use crate::domain::MalformedSnapshot;

/// RAII guard that enters an export-scoped span for the duration of a run.
///
/// ```ignore
/// let _span = ExportSpan::enter(Path::new("events.parquet"));
/// // every event logged from here on carries output = "events.parquet"
/// ```
pub struct ExportSpan {
    _span: tracing::span::EnteredSpan,
}

impl ExportSpan {
    pub fn enter(output: &Path) -> Self {
        let span = tracing::info_span!("snaplog.export", output = %output.display());
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: snapshot history opened.
pub fn emit_history_opened(source: &str, revisions: Option<usize>) {
    info!(event = "history.opened", source = %source, revisions = ?revisions);
}

/// Emit event: a snapshot was skipped (warning level).
pub fn emit_snapshot_skipped(malformed: &MalformedSnapshot) {
    warn!(
        event = "history.snapshot_skipped",
        revision = %malformed.revision,
        reason = %malformed.reason,
    );
}

/// Emit event: all snapshots replayed into the canonical set.
pub fn emit_merge_finished(snapshots: u64, records_seen: u64, canonical: u64) {
    info!(
        event = "merge.finished",
        snapshots = snapshots,
        records_seen = records_seen,
        canonical = canonical,
    );
}

/// Emit event: detail join completed.
pub fn emit_enrichment_finished(joined: u64, missing: u64, unparsable: u64) {
    info!(
        event = "enrich.finished",
        joined = joined,
        missing = missing,
        unparsable = unparsable,
    );
}

/// Emit event: output artifact written.
pub fn emit_export_written(format: &str, path: &Path, records: u64, bytes: u64) {
    info!(
        event = "export.written",
        format = %format,
        path = %path.display(),
        records = records,
        bytes = bytes,
    );
}
