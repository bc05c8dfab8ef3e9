use std::io::Write;

use serde::ser::{SerializeSeq, Serializer};

use super::{ExportSchema, RecordWriter, Row};
use crate::domain::{CanonicalRecord, Result};

/// Pretty-printed JSON array (2-space indent), written row by row.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonArrayWriter;

impl RecordWriter for JsonArrayWriter {
    fn write_records(
        &self,
        records: &[CanonicalRecord],
        schema: &ExportSchema,
        sink: &mut dyn Write,
    ) -> Result<()> {
        let columns = schema.columns();
        let mut serializer = serde_json::Serializer::pretty(&mut *sink);
        let mut seq = serializer.serialize_seq(Some(records.len()))?;
        for record in records {
            seq.serialize_element(&Row::new(record, &columns))?;
        }
        seq.end()?;
        sink.write_all(b"\n")?;
        Ok(())
    }
}

/// One compact JSON object per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesWriter;

impl RecordWriter for JsonLinesWriter {
    fn write_records(
        &self,
        records: &[CanonicalRecord],
        schema: &ExportSchema,
        sink: &mut dyn Write,
    ) -> Result<()> {
        let columns = schema.columns();
        for record in records {
            serde_json::to_writer(&mut *sink, &Row::new(record, &columns))?;
            sink.write_all(b"\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DetailFields;
    use serde_json::Value;

    fn records() -> Vec<CanonicalRecord> {
        (1..=3)
            .map(|i| CanonicalRecord {
                event_id: i.to_string(),
                datetime: format!("2024-01-0{i} 12:00:00 +01:00"),
                name: format!("Händelse {i}"),
                summary: String::new(),
                url: format!("/events/{i}"),
                category: "Övrigt".to_string(),
                location_name: "Kiruna".to_string(),
                latitude: (i != 2).then_some(67.85),
                longitude: (i != 2).then_some(20.22),
                detail: Some(DetailFields::unavailable()),
            })
            .collect()
    }

    #[test]
    fn array_writer_emits_pretty_array() {
        let mut out = Vec::new();
        JsonArrayWriter
            .write_records(&records(), &ExportSchema::new(true), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[\n  {\n    \"event_id\": \"1\""));
        assert!(text.contains("Händelse"), "non-ASCII text stays unescaped");

        let parsed: Value = serde_json::from_str(&text).unwrap();
        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["latitude"], Value::Null);
        assert_eq!(rows[0]["html_available"], Value::Bool(false));
    }

    #[test]
    fn empty_array_is_valid_json() {
        let mut out = Vec::new();
        JsonArrayWriter
            .write_records(&[], &ExportSchema::default(), &mut out)
            .unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, Value::Array(vec![]));
    }

    #[test]
    fn lines_writer_emits_one_object_per_line() {
        let mut out = Vec::new();
        JsonLinesWriter
            .write_records(&records(), &ExportSchema::default(), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        for (i, line) in lines.iter().enumerate() {
            let row: Value = serde_json::from_str(line).unwrap();
            assert_eq!(row["event_id"], Value::String((i + 1).to_string()));
            assert!(row.get("html_available").is_none());
        }
    }
}
