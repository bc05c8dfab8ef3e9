//! Per-run counters for data-quality accounting.
//!
//! Every recovered anomaly is counted here instead of aborting the run.
//! Call [`RunStats::flush`] at the end of a run to emit all values as a
//! single `tracing::info!` event.

use serde::Serialize;

/// Counters for one export run. Owned by the run; nothing is global.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub snapshots_read: u64,
    pub malformed_snapshots: u64,
    pub records_seen: u64,
    pub rejected_records: u64,
    pub coordinate_failures: u64,
    pub canonical_records: u64,
    pub details_joined: u64,
    pub detail_misses: u64,
    pub detail_parse_failures: u64,
    pub unparsable_timestamps: u64,
    pub filtered_out: u64,
    pub records_written: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of every recovered anomaly.
    pub fn anomalies(&self) -> u64 {
        self.malformed_snapshots
            + self.rejected_records
            + self.coordinate_failures
            + self.detail_misses
            + self.detail_parse_failures
            + self.unparsable_timestamps
    }

    /// Anomaly counts keyed by category, in a fixed order.
    pub fn anomaly_breakdown(&self) -> [(&'static str, u64); 6] {
        [
            ("malformed_snapshots", self.malformed_snapshots),
            ("rejected_records", self.rejected_records),
            ("coordinate_failures", self.coordinate_failures),
            ("detail_misses", self.detail_misses),
            ("detail_parse_failures", self.detail_parse_failures),
            ("unparsable_timestamps", self.unparsable_timestamps),
        ]
    }

    /// Emit all counters as one `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            snapshots_read = self.snapshots_read,
            malformed_snapshots = self.malformed_snapshots,
            records_seen = self.records_seen,
            rejected_records = self.rejected_records,
            coordinate_failures = self.coordinate_failures,
            canonical_records = self.canonical_records,
            details_joined = self.details_joined,
            detail_misses = self.detail_misses,
            detail_parse_failures = self.detail_parse_failures,
            unparsable_timestamps = self.unparsable_timestamps,
            filtered_out = self.filtered_out,
            records_written = self.records_written,
        );
    }
}
