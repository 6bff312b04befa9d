//! Arrow schema definition and Parquet output for unified records.
//!
//! Every column is stored as UTF-8 text so amounts keep their full precision
//! and empty cells stay distinguishable from zero.

use std::path::Path;
use std::sync::{Arc, LazyLock};

use anyhow::{Context, Result};
use arrow_array::{ArrayRef, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use txscan::UnifiedRecord;

use super::{COLUMNS, Row, write_atomic};

/// Arrow schema of the export: `hash` and `type` are required, the rest
/// nullable.
static RECORD_SCHEMA: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    Arc::new(Schema::new(
        COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, !matches!(*name, "hash" | "type")))
            .collect::<Vec<_>>(),
    ))
});

/// Convert records into one columnar [`RecordBatch`].
///
/// # Errors
///
/// Returns an error if the Arrow `RecordBatch` construction fails.
pub fn records_to_batch(records: &[UnifiedRecord]) -> Result<RecordBatch> {
    let rows: Vec<Row> = records.iter().map(Row::from).collect();
    let batch = RecordBatch::try_new(
        Arc::clone(&RECORD_SCHEMA),
        vec![
            column(rows.iter().map(|r| Some(r.hash.as_str()))),
            column(rows.iter().map(|r| Some(r.kind))),
            column(rows.iter().map(|r| r.timestamp.as_deref())),
            column(rows.iter().map(|r| Some(r.from.as_str()))),
            column(rows.iter().map(|r| Some(r.to.as_str()))),
            column(rows.iter().map(|r| r.value.as_deref())),
            column(rows.iter().map(|r| r.token_id.as_deref())),
            column(rows.iter().map(|r| r.token_symbol.as_deref())),
            column(rows.iter().map(|r| r.gas_used.as_deref())),
            column(rows.iter().map(|r| r.gas_price.as_deref())),
            column(rows.iter().map(|r| r.gas_fee_computed.as_deref())),
        ],
    )?;
    Ok(batch)
}

fn column<'a>(cells: impl Iterator<Item = Option<&'a str>>) -> ArrayRef {
    Arc::new(cells.collect::<StringArray>())
}

/// Write `records` to a Parquet file using Zstd compression.
///
/// Written to a `.parquet.tmp` sibling and renamed into place.
///
/// # Errors
///
/// Returns an error on I/O failure or if the Parquet writer rejects the data.
pub fn write(path: &Path, records: &[UnifiedRecord]) -> Result<()> {
    let batch = records_to_batch(records)?;
    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::ZSTD(
            parquet::basic::ZstdLevel::try_new(3).context("invalid zstd level")?,
        ))
        .build();

    write_atomic(path, &path.with_extension("parquet.tmp"), |tmp| {
        let file =
            std::fs::File::create(tmp).with_context(|| format!("creating {}", tmp.display()))?;
        let mut writer = ArrowWriter::try_new(file, Arc::clone(&RECORD_SCHEMA), Some(props))?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    })
}
