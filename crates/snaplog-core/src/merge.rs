//! Last-write-wins fold of a snapshot log into one record per identifier.
//!
//! Snapshots are rolling windows, so the same event shows up in many of
//! them. Replaying the log oldest first and overwriting on every sighting
//! leaves the newest copy of each event. The accumulator is an explicit map;
//! correctness relies only on the [`SnapshotSource`] ordering contract.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::domain::{CanonicalRecord, Result};
use crate::history::{LogEntry, SnapshotSource};
use crate::metrics::RunStats;
use crate::normalize::normalize_entry;
use crate::obs;

/// Deduplicated records keyed by identifier. Iteration is in identifier order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalSet {
    records: BTreeMap<String, CanonicalRecord>,
}

impl CanonicalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or fully replace the record for its identifier.
    pub fn upsert(&mut self, record: CanonicalRecord) -> Option<CanonicalRecord> {
        self.records.insert(record.event_id.clone(), record)
    }

    pub fn get(&self, event_id: &str) -> Option<&CanonicalRecord> {
        self.records.get(event_id)
    }

    pub fn get_mut(&mut self, event_id: &str) -> Option<&mut CanonicalRecord> {
        self.records.get_mut(event_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalRecord> {
        self.records.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CanonicalRecord> {
        self.records.values_mut()
    }

    /// Keep only the records for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&CanonicalRecord) -> bool) {
        self.records.retain(|_, record| keep(record));
    }

    /// Consume the set, yielding records in identifier order.
    pub fn into_records(self) -> Vec<CanonicalRecord> {
        self.records.into_values().collect()
    }
}

/// Replay every snapshot from `source` into a [`CanonicalSet`].
///
/// Malformed snapshots and rejected entries are counted in `stats` and
/// skipped. Coordinate failures are counted once per surviving record, so an
/// event repeated across many snapshots is not counted many times. Only a
/// history access failure aborts the replay.
pub fn merge_history(
    source: &mut dyn SnapshotSource,
    stats: &mut RunStats,
) -> Result<CanonicalSet> {
    let mut canonical = CanonicalSet::new();
    let mut bad_coordinates: BTreeSet<String> = BTreeSet::new();
    let mut last_captured = None;

    while let Some(entry) = source.next_snapshot()? {
        let snapshot = match entry {
            LogEntry::Snapshot(snapshot) => snapshot,
            LogEntry::Malformed(malformed) => {
                stats.malformed_snapshots += 1;
                obs::emit_snapshot_skipped(&malformed);
                continue;
            }
        };

        if let Some(previous) = last_captured {
            if snapshot.captured_at < previous {
                warn!(
                    revision = %snapshot.revision,
                    captured_at = %snapshot.captured_at,
                    "snapshot timestamp precedes the previous snapshot; keeping log order"
                );
            }
        }
        last_captured = Some(snapshot.captured_at);

        stats.snapshots_read += 1;
        stats.records_seen += snapshot.entries.len() as u64;

        for raw in &snapshot.entries {
            let normalized = match normalize_entry(raw) {
                Ok(normalized) => normalized,
                Err(reason) => {
                    stats.rejected_records += 1;
                    debug!(revision = %snapshot.revision, %reason, "entry rejected");
                    continue;
                }
            };

            let event_id = normalized.record.event_id.clone();
            match normalized.coordinate_fault {
                Some(fault) => {
                    debug!(event_id = %event_id, %fault, "coordinates dropped");
                    bad_coordinates.insert(event_id);
                }
                None => {
                    bad_coordinates.remove(&event_id);
                }
            }
            canonical.upsert(normalized.record);
        }

        if stats.snapshots_read % 1000 == 0 {
            debug!(
                snapshots = stats.snapshots_read,
                canonical = canonical.len(),
                remaining = ?source.remaining_hint(),
                "replay progress"
            );
        }
    }

    for event_id in &bad_coordinates {
        warn!(event_id = %event_id, "invalid coordinates; latitude and longitude left empty");
    }
    stats.coordinate_failures = bad_coordinates.len() as u64;
    stats.canonical_records = canonical.len() as u64;
    obs::emit_merge_finished(stats.snapshots_read, stats.records_seen, stats.canonical_records);

    Ok(canonical)
}
