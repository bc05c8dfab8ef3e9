//! Detail join: attach side-archive fields to canonical records.
//!
//! Documents are loaded and parsed in parallel. Outcomes are applied by
//! identifier afterwards, so the result does not depend on completion order.
//! Every record leaves this stage with `html_available` set.

mod archive;
mod extract;

pub use archive::{DetailArchive, FsDetailArchive, MemoryDetailArchive};
pub use extract::parse_detail_document;

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{DetailEntry, DetailFields};
use crate::merge::CanonicalSet;
use crate::metrics::RunStats;
use crate::obs;

/// Result of looking up one identifier in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    Found(DetailEntry),
    Missing,
    Unparsable(String),
}

/// Load and parse the document for `event_id`.
pub fn lookup_detail(archive: &dyn DetailArchive, event_id: &str) -> DetailOutcome {
    match archive.load(event_id) {
        Ok(Some(document)) => match parse_detail_document(&document) {
            Some(entry) => DetailOutcome::Found(entry),
            None => DetailOutcome::Unparsable("no event container in document".to_string()),
        },
        Ok(None) => DetailOutcome::Missing,
        Err(e) => DetailOutcome::Unparsable(format!("read failed: {e}")),
    }
}

/// How the join resolved for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailStatus {
    Joined,
    Missing,
    Unparsable,
}

/// Join status per identifier from one enrichment pass.
///
/// Counting is deferred to [`DetailLedger::tally`] so that records dropped by
/// a later stage do not show up in the detail counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailLedger {
    statuses: BTreeMap<String, DetailStatus>,
}

impl DetailLedger {
    pub fn status(&self, event_id: &str) -> Option<DetailStatus> {
        self.statuses.get(event_id).copied()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Count the join status of every record still in `records`.
    pub fn tally(&self, records: &CanonicalSet, stats: &mut RunStats) {
        for event_id in records.ids() {
            match self.status(event_id) {
                Some(DetailStatus::Joined) => stats.details_joined += 1,
                Some(DetailStatus::Missing) => stats.detail_misses += 1,
                Some(DetailStatus::Unparsable) => stats.detail_parse_failures += 1,
                None => {}
            }
        }
        obs::emit_enrichment_finished(
            stats.details_joined,
            stats.detail_misses,
            stats.detail_parse_failures,
        );
    }
}

/// Join every record in `records` with its archive entry.
pub fn enrich_records(
    mut records: CanonicalSet,
    archive: &dyn DetailArchive,
) -> (CanonicalSet, DetailLedger) {
    let ids: Vec<String> = records.ids().map(str::to_string).collect();

    let outcomes: Vec<(String, DetailOutcome)> = ids
        .into_par_iter()
        .map(|event_id| {
            let outcome = lookup_detail(archive, &event_id);
            (event_id, outcome)
        })
        .collect();

    let mut ledger = DetailLedger::default();
    for (event_id, outcome) in outcomes {
        let Some(record) = records.get_mut(&event_id) else {
            continue;
        };
        let (status, fields) = match outcome {
            DetailOutcome::Found(entry) => (DetailStatus::Joined, DetailFields::from(entry)),
            DetailOutcome::Missing => {
                debug!(event_id = %event_id, "no detail document");
                (DetailStatus::Missing, DetailFields::unavailable())
            }
            DetailOutcome::Unparsable(reason) => {
                warn!(event_id = %event_id, reason = %reason, "detail document unusable");
                (DetailStatus::Unparsable, DetailFields::unavailable())
            }
        };
        record.detail = Some(fields);
        ledger.statuses.insert(event_id, status);
    }

    (records, ledger)
}
