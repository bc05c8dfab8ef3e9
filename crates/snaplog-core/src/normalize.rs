//! Typed view of raw snapshot entries.
//!
//! Entries arrive as untyped JSON objects:
//!
//! ```text
//! { "id": 589371, "datetime": "2025-11-13 20:14:24 +01:00", "name": "...",
//!   "summary": "...", "url": "/aktuellt/...", "type": "Trafikolycka",
//!   "location": { "name": "Sundsvall", "gps": "62.390811,17.306927" } }
//! ```
//!
//! An entry without identifier or timestamp is rejected. A bad coordinate
//! string never rejects the entry; both coordinates are left absent instead.

use serde_json::{Map, Value};

use crate::domain::{CanonicalRecord, CoordinateParseFailure, RecordRejection};

/// A record ready for merging, with any coordinate problem kept alongside.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub record: CanonicalRecord,
    pub coordinate_fault: Option<CoordinateParseFailure>,
}

/// Split a `"lat,lon"` string into WGS84 coordinates.
///
/// Both halves must parse as finite numbers with latitude in [-90, 90] and
/// longitude in [-180, 180]; the pair is accepted or rejected as a whole.
pub fn parse_coordinates(raw: &str) -> Result<(f64, f64), CoordinateParseFailure> {
    let fail = |reason: &str| CoordinateParseFailure {
        raw: raw.to_string(),
        reason: reason.to_string(),
    };

    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 2 {
        return Err(fail(&format!(
            "expected 2 comma-separated values, got {}",
            parts.len()
        )));
    }

    let lat: f64 = parts[0]
        .trim()
        .parse()
        .map_err(|_| fail("latitude is not a number"))?;
    let lon: f64 = parts[1]
        .trim()
        .parse()
        .map_err(|_| fail("longitude is not a number"))?;

    if !lat.is_finite() || !lon.is_finite() {
        return Err(fail("coordinates must be finite"));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(fail("latitude outside [-90, 90]"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(fail("longitude outside [-180, 180]"));
    }

    Ok((lat, lon))
}

/// Turn one raw entry into a typed record.
pub fn normalize_entry(entry: &Value) -> Result<NormalizedRecord, RecordRejection> {
    let obj = entry.as_object().ok_or(RecordRejection::NotAnObject)?;

    let event_id = identifier(obj.get("id")).ok_or(RecordRejection::MissingIdentifier)?;
    let datetime = text(obj, "datetime");
    if datetime.is_empty() {
        return Err(RecordRejection::MissingTimestamp);
    }

    let location = obj.get("location").and_then(Value::as_object);
    let location_name = location.map(|l| text(l, "name")).unwrap_or_default();
    let gps = location.map(|l| text(l, "gps")).unwrap_or_default();

    let (coordinates, coordinate_fault) = if gps.trim().is_empty() {
        (None, None)
    } else {
        match parse_coordinates(&gps) {
            Ok(pair) => (Some(pair), None),
            Err(fault) => (None, Some(fault)),
        }
    };

    let record = CanonicalRecord {
        event_id,
        datetime,
        name: text(obj, "name"),
        summary: text(obj, "summary"),
        url: text(obj, "url"),
        category: text(obj, "type"),
        location_name,
        latitude: coordinates.map(|(lat, _)| lat),
        longitude: coordinates.map(|(_, lon)| lon),
        detail: None,
    };

    Ok(NormalizedRecord {
        record,
        coordinate_fault,
    })
}

fn identifier(value: Option<&Value>) -> Option<String> {
    let id = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

fn text(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}
