//! Inclusive calendar-date filter over event timestamps.

use chrono::{DateTime, FixedOffset, NaiveDate};
use tracing::{debug, info};

use crate::domain::{CanonicalRecord, Result, SnaplogError};
use crate::merge::CanonicalSet;
use crate::metrics::RunStats;

const FEED_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

/// Parse a record timestamp (`2025-11-13 20:14:24 +01:00`, or RFC 3339).
pub fn parse_event_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_str(raw, FEED_DATETIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

/// Inclusive `[start, end]` range of calendar dates. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(SnaplogError::InvalidDateRange { start, end });
            }
        }
        Ok(Self { start, end })
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether `date` lies inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }

    /// Whether the record's date, taken in its own UTC offset, lies inside the range.
    /// `None` when the timestamp cannot be parsed.
    pub fn admits(&self, record: &CanonicalRecord) -> Option<bool> {
        parse_event_datetime(&record.datetime).map(|dt| self.contains(dt.date_naive()))
    }
}

/// Drop records outside `range`.
///
/// With no bounds this is a no-op. Otherwise records whose timestamp cannot
/// be parsed are dropped and counted as `unparsable_timestamps`.
pub fn apply_date_range(
    mut records: CanonicalSet,
    range: &DateRange,
    stats: &mut RunStats,
) -> CanonicalSet {
    if range.is_unbounded() {
        return records;
    }

    let before = records.len();
    let mut unparsable = 0u64;
    records.retain(|record| match range.admits(record) {
        Some(keep) => keep,
        None => {
            debug!(
                event_id = %record.event_id,
                datetime = %record.datetime,
                "unparsable timestamp"
            );
            unparsable += 1;
            false
        }
    });

    stats.unparsable_timestamps += unparsable;
    stats.filtered_out += (before - records.len()) as u64 - unparsable;
    info!(
        start = ?range.start,
        end = ?range.end,
        kept = records.len(),
        "date range applied"
    );
    records
}
