//! Canonical event record and the detail fields joined onto it.

use serde::{Deserialize, Serialize};

/// Structured fields extracted from one detail document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetailEntry {
    pub title: Option<String>,
    pub preamble: Option<String>,
    pub body: Option<String>,
    pub published_datetime: Option<String>,
    pub author: Option<String>,
}

/// Detail columns attached to a record once enrichment has run.
///
/// `html_available` is never null: a join miss is recorded as `false` with
/// every other field absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DetailFields {
    pub html_title: Option<String>,
    pub html_preamble: Option<String>,
    pub html_body: Option<String>,
    pub html_published_datetime: Option<String>,
    pub html_author: Option<String>,
    pub html_available: bool,
}

impl DetailFields {
    pub fn unavailable() -> Self {
        Self::default()
    }
}

impl From<DetailEntry> for DetailFields {
    fn from(entry: DetailEntry) -> Self {
        Self {
            html_title: entry.title,
            html_preamble: entry.preamble,
            html_body: entry.body,
            html_published_datetime: entry.published_datetime,
            html_author: entry.author,
            html_available: true,
        }
    }
}

/// The surviving version of one logical event after all snapshots are merged.
///
/// Field order here is the column order of every output format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalRecord {
    pub event_id: String,
    pub datetime: String,
    pub name: String,
    pub summary: String,
    pub url: String,
    #[serde(rename = "type")]
    pub category: String,
    pub location_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(flatten)]
    pub detail: Option<DetailFields>,
}

impl CanonicalRecord {
    /// Coordinates as a pair; both are present or neither is.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.detail.is_some()
    }
}
