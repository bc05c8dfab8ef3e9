//! Domain models for snaplog.
//!
//! - `CanonicalRecord`: one deduplicated event, optionally carrying detail fields
//! - `DetailEntry`: structured content extracted from a detail document
//! - `SnaplogError` and the recoverable anomaly types

pub mod error;
pub mod record;

pub use error::{
    CoordinateParseFailure, MalformedSnapshot, RecordRejection, Result, SnaplogError,
};
pub use record::{CanonicalRecord, DetailEntry, DetailFields};
