use std::collections::VecDeque;

use chrono::{DateTime, FixedOffset};

use super::{decode_snapshot, LogEntry, Snapshot, SnapshotSource};
use crate::domain::Result;

/// In-memory snapshot log. Revisions are replayed in insertion order.
#[derive(Debug, Default)]
pub struct MemorySnapshotLog {
    pending: VecDeque<LogEntry>,
}

impl MemorySnapshotLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw snapshot bytes; they are decoded the same way git content is.
    pub fn push_bytes(
        &mut self,
        revision: impl Into<String>,
        captured_at: DateTime<FixedOffset>,
        bytes: &[u8],
    ) {
        let revision = revision.into();
        let entry = match decode_snapshot(&revision, bytes) {
            Ok(entries) => LogEntry::Snapshot(Snapshot {
                revision,
                captured_at,
                entries,
            }),
            Err(malformed) => LogEntry::Malformed(malformed),
        };
        self.pending.push_back(entry);
    }

    /// Append an already-decoded snapshot.
    pub fn push_entries(
        &mut self,
        revision: impl Into<String>,
        captured_at: DateTime<FixedOffset>,
        entries: Vec<serde_json::Value>,
    ) {
        self.pending.push_back(LogEntry::Snapshot(Snapshot {
            revision: revision.into(),
            captured_at,
            entries,
        }));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl SnapshotSource for MemorySnapshotLog {
    fn next_snapshot(&mut self) -> Result<Option<LogEntry>> {
        Ok(self.pending.pop_front())
    }

    fn remaining_hint(&self) -> Option<usize> {
        Some(self.pending.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn replays_in_insertion_order() {
        let mut log = MemorySnapshotLog::new();
        log.push_entries("a", ts("2024-01-01T00:00:00Z"), vec![json!({"id": 1})]);
        log.push_bytes("b", ts("2024-01-01T00:30:00Z"), b"not json");
        log.push_entries("c", ts("2024-01-01T01:00:00Z"), vec![]);
        assert_eq!(log.remaining_hint(), Some(3));

        let mut seen = Vec::new();
        while let Some(entry) = log.next_snapshot().unwrap() {
            seen.push(match entry {
                LogEntry::Snapshot(s) => s.revision,
                LogEntry::Malformed(m) => format!("bad:{}", m.revision),
            });
        }
        assert_eq!(seen, vec!["a", "bad:b", "c"]);
        assert!(log.is_empty());
    }
}
