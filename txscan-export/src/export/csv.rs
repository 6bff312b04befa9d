//! CSV output.

use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use txscan::UnifiedRecord;

use super::{COLUMNS, Row, write_atomic};

/// Write `records` as CSV with a header row.
///
/// The header is written even when `records` is empty.
///
/// # Errors
///
/// Returns an error on I/O failure.
pub fn write(path: &Path, records: &[UnifiedRecord]) -> Result<()> {
    write_atomic(path, &path.with_extension("csv.tmp"), |tmp| {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;

        writer.write_record(COLUMNS)?;
        for record in records {
            writer.serialize(Row::from(record))?;
        }
        writer
            .flush()
            .with_context(|| format!("writing {}", tmp.display()))
    })
}
