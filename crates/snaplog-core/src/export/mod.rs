//! Format-dispatching writer for the final record set.
//!
//! The output format is chosen once from the destination extension
//! ([`OutputFormat::from_path`]) and mapped to one [`RecordWriter`] strategy.
//! Every strategy reads cells through [`ExportColumn`], so column names,
//! order and types are identical across formats.

mod json;
mod parquet;

pub use json::{JsonArrayWriter, JsonLinesWriter};
pub use parquet::ParquetFileWriter;

use std::fmt;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::ser::{Serialize, SerializeMap, Serializer};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::domain::{CanonicalRecord, DetailFields, Result, SnaplogError};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `.json`: one pretty-printed array of row objects.
    Json,
    /// `.jsonl` / `.ndjson`: one compact object per line.
    JsonLines,
    /// `.parquet`: zstd-compressed columnar file.
    Parquet,
}

impl OutputFormat {
    /// Infer the format from the extension of `path` (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            "parquet" => Ok(Self::Parquet),
            _ => Err(SnaplogError::UnsupportedFormat { extension }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::JsonLines => "jsonl",
            Self::Parquet => "parquet",
        }
    }

    /// The writer strategy for this format.
    pub fn writer(&self) -> Box<dyn RecordWriter> {
        match self {
            Self::Json => Box::new(JsonArrayWriter),
            Self::JsonLines => Box::new(JsonLinesWriter),
            Self::Parquet => Box::new(ParquetFileWriter::default()),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared type of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Non-null text.
    Text,
    /// Nullable text.
    OptionalText,
    /// Nullable 64-bit float.
    Float64,
    /// Non-null boolean.
    Boolean,
}

/// One output column, in contract order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportColumn {
    EventId,
    Datetime,
    Name,
    Summary,
    Url,
    Type,
    LocationName,
    Latitude,
    Longitude,
    HtmlTitle,
    HtmlPreamble,
    HtmlBody,
    HtmlPublishedDatetime,
    HtmlAuthor,
    HtmlAvailable,
}

const BASE_COLUMNS: [ExportColumn; 9] = [
    ExportColumn::EventId,
    ExportColumn::Datetime,
    ExportColumn::Name,
    ExportColumn::Summary,
    ExportColumn::Url,
    ExportColumn::Type,
    ExportColumn::LocationName,
    ExportColumn::Latitude,
    ExportColumn::Longitude,
];

const DETAIL_COLUMNS: [ExportColumn; 6] = [
    ExportColumn::HtmlTitle,
    ExportColumn::HtmlPreamble,
    ExportColumn::HtmlBody,
    ExportColumn::HtmlPublishedDatetime,
    ExportColumn::HtmlAuthor,
    ExportColumn::HtmlAvailable,
];

/// A single typed value read from a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    OptionalText(Option<&'a str>),
    Float64(Option<f64>),
    Boolean(bool),
}

impl<'a> Cell<'a> {
    pub fn as_text(&self) -> Option<&'a str> {
        match *self {
            Cell::Text(s) => Some(s),
            Cell::OptionalText(s) => s,
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Cell::Float64(v) => v,
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Cell::Boolean(v) => Some(v),
            _ => None,
        }
    }
}

impl Serialize for Cell<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match *self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::OptionalText(s) => s.serialize(serializer),
            Cell::Float64(v) => v.serialize(serializer),
            Cell::Boolean(v) => serializer.serialize_bool(v),
        }
    }
}

impl ExportColumn {
    pub fn name(&self) -> &'static str {
        match self {
            Self::EventId => "event_id",
            Self::Datetime => "datetime",
            Self::Name => "name",
            Self::Summary => "summary",
            Self::Url => "url",
            Self::Type => "type",
            Self::LocationName => "location_name",
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
            Self::HtmlTitle => "html_title",
            Self::HtmlPreamble => "html_preamble",
            Self::HtmlBody => "html_body",
            Self::HtmlPublishedDatetime => "html_published_datetime",
            Self::HtmlAuthor => "html_author",
            Self::HtmlAvailable => "html_available",
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Latitude | Self::Longitude => ColumnKind::Float64,
            Self::HtmlAvailable => ColumnKind::Boolean,
            Self::HtmlTitle
            | Self::HtmlPreamble
            | Self::HtmlBody
            | Self::HtmlPublishedDatetime
            | Self::HtmlAuthor => ColumnKind::OptionalText,
            _ => ColumnKind::Text,
        }
    }

    /// Read this column from `record`. A record without detail fields reads
    /// as unavailable.
    pub fn value<'a>(&self, record: &'a CanonicalRecord) -> Cell<'a> {
        const NO_DETAIL: &DetailFields = &DetailFields {
            html_title: None,
            html_preamble: None,
            html_body: None,
            html_published_datetime: None,
            html_author: None,
            html_available: false,
        };
        let detail = record.detail.as_ref().unwrap_or(NO_DETAIL);
        match self {
            Self::EventId => Cell::Text(&record.event_id),
            Self::Datetime => Cell::Text(&record.datetime),
            Self::Name => Cell::Text(&record.name),
            Self::Summary => Cell::Text(&record.summary),
            Self::Url => Cell::Text(&record.url),
            Self::Type => Cell::Text(&record.category),
            Self::LocationName => Cell::Text(&record.location_name),
            Self::Latitude => Cell::Float64(record.latitude),
            Self::Longitude => Cell::Float64(record.longitude),
            Self::HtmlTitle => Cell::OptionalText(detail.html_title.as_deref()),
            Self::HtmlPreamble => Cell::OptionalText(detail.html_preamble.as_deref()),
            Self::HtmlBody => Cell::OptionalText(detail.html_body.as_deref()),
            Self::HtmlPublishedDatetime => {
                Cell::OptionalText(detail.html_published_datetime.as_deref())
            }
            Self::HtmlAuthor => Cell::OptionalText(detail.html_author.as_deref()),
            Self::HtmlAvailable => Cell::Boolean(detail.html_available),
        }
    }
}

/// Which columns an export carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSchema {
    pub include_details: bool,
}

impl ExportSchema {
    pub fn new(include_details: bool) -> Self {
        Self { include_details }
    }

    pub fn columns(&self) -> Vec<ExportColumn> {
        let mut columns = BASE_COLUMNS.to_vec();
        if self.include_details {
            columns.extend(DETAIL_COLUMNS);
        }
        columns
    }
}

/// Serializes one record as an object whose keys follow the schema order.
pub struct Row<'a> {
    record: &'a CanonicalRecord,
    columns: &'a [ExportColumn],
}

impl<'a> Row<'a> {
    pub fn new(record: &'a CanonicalRecord, columns: &'a [ExportColumn]) -> Self {
        Self { record, columns }
    }
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in self.columns {
            map.serialize_entry(column.name(), &column.value(self.record))?;
        }
        map.end()
    }
}

/// A serialization strategy for one output format.
pub trait RecordWriter {
    fn write_records(
        &self,
        records: &[CanonicalRecord],
        schema: &ExportSchema,
        sink: &mut dyn Write,
    ) -> Result<()>;
}

/// Write `records` to `path` atomically: the content goes to a temporary
/// file next to `path`, which is then renamed into place. Returns the size
/// of the written file in bytes.
///
/// The artifact gets the permissions a plain `create` would give it (0o666
/// less the umask), or keeps those of the file it replaces.
pub fn write_to_path(
    writer: &dyn RecordWriter,
    records: &[CanonicalRecord],
    schema: &ExportSchema,
    path: &Path,
) -> Result<u64> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp = staging_file(dir)?;
    if let Ok(existing) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    {
        let mut sink = BufWriter::new(tmp.as_file());
        writer.write_records(records, schema, &mut sink)?;
        sink.flush()?;
    }
    tmp.as_file().sync_all()?;
    let file = tmp.persist(path).map_err(|e| e.error)?;
    Ok(file.metadata()?.len())
}

fn staging_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".snaplog-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// SHA-256 hex digest of the records as compact JSON lines in output order.
///
/// Two replays of the same history and archive produce the same digest.
pub fn records_digest(records: &[CanonicalRecord], schema: &ExportSchema) -> Result<String> {
    let columns = schema.columns();
    let mut hasher = Sha256::new();
    for record in records {
        let line = serde_json::to_vec(&Row::new(record, &columns))?;
        hasher.update(&line);
        hasher.update(b"\n");
    }
    Ok(hex::encode(hasher.finalize()))
}
