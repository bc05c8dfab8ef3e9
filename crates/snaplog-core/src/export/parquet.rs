use std::io::Write;

use polars::prelude::*;

use super::{ColumnKind, ExportColumn, ExportSchema, RecordWriter};
use crate::domain::{CanonicalRecord, Result};

/// Columnar Parquet output with an explicit type per column.
#[derive(Debug, Clone)]
pub struct ParquetFileWriter {
    compression: ParquetCompression,
}

impl Default for ParquetFileWriter {
    fn default() -> Self {
        Self {
            compression: ParquetCompression::Zstd(None),
        }
    }
}

impl ParquetFileWriter {
    pub fn with_compression(compression: ParquetCompression) -> Self {
        Self { compression }
    }
}

/// Build the record batch. Column types come from [`ExportColumn::kind`],
/// never from the values, so an empty or all-null column keeps its type.
pub fn to_dataframe(
    records: &[CanonicalRecord],
    schema: &ExportSchema,
) -> PolarsResult<DataFrame> {
    let columns = schema
        .columns()
        .into_iter()
        .map(|column| build_column(column, records).cast(&dtype_of(column.kind())))
        .collect::<PolarsResult<Vec<_>>>()?;
    DataFrame::new(columns)
}

fn build_column(column: ExportColumn, records: &[CanonicalRecord]) -> Column {
    let name: PlSmallStr = column.name().into();
    match column.kind() {
        ColumnKind::Text => {
            let values: Vec<&str> = records
                .iter()
                .map(|r| column.value(r).as_text().unwrap_or_default())
                .collect();
            Column::new(name, values)
        }
        ColumnKind::OptionalText => {
            let values: Vec<Option<&str>> =
                records.iter().map(|r| column.value(r).as_text()).collect();
            Column::new(name, values)
        }
        ColumnKind::Float64 => {
            let values: Vec<Option<f64>> =
                records.iter().map(|r| column.value(r).as_f64()).collect();
            Column::new(name, values)
        }
        ColumnKind::Boolean => {
            let values: Vec<bool> = records
                .iter()
                .map(|r| column.value(r).as_bool().unwrap_or(false))
                .collect();
            Column::new(name, values)
        }
    }
}

/// Polars dtype declared for a column kind.
fn dtype_of(kind: ColumnKind) -> DataType {
    match kind {
        ColumnKind::Text | ColumnKind::OptionalText => DataType::String,
        ColumnKind::Float64 => DataType::Float64,
        ColumnKind::Boolean => DataType::Boolean,
    }
}

impl RecordWriter for ParquetFileWriter {
    fn write_records(
        &self,
        records: &[CanonicalRecord],
        schema: &ExportSchema,
        sink: &mut dyn Write,
    ) -> Result<()> {
        let mut df = to_dataframe(records, schema)?;
        let mut buffer = Vec::new();
        ParquetWriter::new(&mut buffer)
            .with_compression(self.compression)
            .finish(&mut df)?;
        sink.write_all(&buffer)?;
        Ok(())
    }
}
