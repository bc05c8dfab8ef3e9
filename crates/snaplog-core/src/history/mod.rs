//! Ordered replay of a snapshot log.
//!
//! A [`SnapshotSource`] hands out snapshots one at a time, oldest first. The
//! merger depends only on this trait, so any versioned store can back it:
//! [`GitSnapshotLog`] reads a tracked file's git history and
//! [`MemorySnapshotLog`] replays snapshots already held in memory.
//!
//! Chronological order is part of the contract. Implementations must never
//! yield a snapshot captured earlier than one already returned.

mod git_log;
mod memory;

pub use git_log::GitSnapshotLog;
pub use memory::MemorySnapshotLog;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::domain::{MalformedSnapshot, Result};

/// One captured copy of the rolling-window record list.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Identifier of the revision in the backing store.
    pub revision: String,
    /// When the snapshot was committed, taken from the log rather than the content.
    pub captured_at: DateTime<FixedOffset>,
    /// The raw entries, untyped.
    pub entries: Vec<Value>,
}

/// Result of reading the next position in the log.
#[derive(Debug, Clone)]
pub enum LogEntry {
    Snapshot(Snapshot),
    Malformed(MalformedSnapshot),
}

/// Lazy, oldest-first sequence of snapshots.
pub trait SnapshotSource {
    /// Read the next snapshot, or `None` once the log is exhausted.
    ///
    /// A revision whose content is unusable comes back as
    /// [`LogEntry::Malformed`]; only failures that prevent further traversal
    /// are returned as errors.
    fn next_snapshot(&mut self) -> Result<Option<LogEntry>>;

    /// Number of revisions still to be read, when known up front.
    fn remaining_hint(&self) -> Option<usize> {
        None
    }
}

/// Decode snapshot bytes into raw entries. The top-level value must be an array.
pub fn decode_snapshot(
    revision: &str,
    bytes: &[u8],
) -> std::result::Result<Vec<Value>, MalformedSnapshot> {
    let malformed = |reason: String| MalformedSnapshot {
        revision: revision.to_string(),
        reason,
    };
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Array(entries)) => Ok(entries),
        Ok(other) => Err(malformed(format!(
            "expected a JSON array, found {}",
            json_kind(&other)
        ))),
        Err(e) => Err(malformed(format!("invalid JSON: {e}"))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
