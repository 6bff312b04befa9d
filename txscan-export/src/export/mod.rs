//! Tabular export of unified records.
//!
//! Every format writes the same fixed column set; cells a category does not
//! carry are left empty. Output files are written to a temporary sibling
//! and renamed into place, so a failed export never leaves a partial file.

pub mod csv;
pub mod parquet;

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use txscan::UnifiedRecord;

/// Rendering of [`UnifiedRecord::timestamp`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output columns, in order.
pub const COLUMNS: [&str; 11] = [
    "hash",
    "type",
    "timestamp",
    "from",
    "to",
    "value",
    "tokenId",
    "tokenSymbol",
    "gasUsed",
    "gasPrice",
    "gasFeeComputed",
];

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Comma-separated values with a header row.
    Csv,
    /// Apache Parquet, Zstd-compressed.
    Parquet,
}

impl Format {
    /// Pick a format from the file extension, defaulting to CSV.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => Self::Parquet,
            _ => Self::Csv,
        }
    }
}

/// One output row: every cell rendered as text, empty cells as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Transaction hash.
    pub hash: String,
    /// Category label.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// UTC block time.
    pub timestamp: Option<String>,
    /// Sender.
    pub from: String,
    /// Recipient.
    pub to: String,
    /// Decimal amount.
    pub value: Option<String>,
    /// ERC-721 token ID.
    pub token_id: Option<String>,
    /// Token ticker.
    pub token_symbol: Option<String>,
    /// Gas units consumed.
    pub gas_used: Option<String>,
    /// Price per gas unit in wei.
    pub gas_price: Option<String>,
    /// `gasUsed * gasPrice` in wei.
    pub gas_fee_computed: Option<String>,
}

impl From<&UnifiedRecord> for Row {
    fn from(record: &UnifiedRecord) -> Self {
        Self {
            hash: record.hash.clone(),
            kind: record.category.as_str(),
            timestamp: record
                .timestamp
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
            from: record.from.clone(),
            to: record.to.clone(),
            value: record.value.map(|v| v.to_string()),
            token_id: record.token_id.clone(),
            token_symbol: record.token_symbol.clone(),
            gas_used: record.gas.map(|g| g.used.to_string()),
            gas_price: record.gas.map(|g| g.price.to_string()),
            gas_fee_computed: record.gas.map(|g| g.fee.to_string()),
        }
    }
}

/// Write `records` to `path` in `format`.
///
/// # Errors
///
/// Returns an error on I/O failure or if the encoder rejects the data.
pub fn write(path: &Path, format: Format, records: &[UnifiedRecord]) -> Result<()> {
    match format {
        Format::Csv => csv::write(path, records),
        Format::Parquet => parquet::write(path, records),
    }
}

/// Fill `path`'s temporary sibling `tmp` with `fill`, then rename it into
/// place. The temporary file is removed if either step fails.
fn write_atomic(path: &Path, tmp: &Path, fill: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let result = fill(tmp).and_then(|()| {
        std::fs::rename(tmp, path)
            .with_context(|| format!("renaming {} → {}", tmp.display(), path.display()))
    });
    if result.is_err() && tmp.exists() {
        std::fs::remove_file(tmp).ok();
    }
    result
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;
    use chrono::DateTime;
    use txscan::{Category, GasCost, TokenAmount};

    use super::*;

    #[test]
    fn row_leaves_inapplicable_cells_empty() {
        let record = UnifiedRecord {
            hash: "0xaaa".to_owned(),
            category: Category::Erc721,
            timestamp: DateTime::from_timestamp(1_631_022_244, 0),
            from: "0xfrom".to_owned(),
            to: "0xto".to_owned(),
            value: None,
            token_id: Some("7".to_owned()),
            token_symbol: Some("PUNK".to_owned()),
            gas: None,
        };
        let row = Row::from(&record);
        assert_eq!(row.kind, "ERC721", "type label");
        assert_eq!(row.timestamp.as_deref(), Some("2021-09-07 13:44:04"), "timestamp");
        assert_eq!(row.value, None, "no value");
        assert_eq!(row.gas_fee_computed, None, "no gas");
    }

    #[test]
    fn row_renders_gas_and_value() {
        let record = UnifiedRecord {
            hash: "0xaaa".to_owned(),
            category: Category::External,
            timestamp: None,
            from: "0xfrom".to_owned(),
            to: "0xto".to_owned(),
            value: Some(TokenAmount::new(U256::from(1_000_000_000_000_000_000u64), 18)),
            token_id: None,
            token_symbol: None,
            gas: GasCost::new(U256::from(21_000u64), U256::from(50u8)),
        };
        let row = Row::from(&record);
        assert_eq!(row.value.as_deref(), Some("1.0"), "value");
        assert_eq!(row.gas_used.as_deref(), Some("21000"), "gas used");
        assert_eq!(row.gas_price.as_deref(), Some("50"), "gas price");
        assert_eq!(row.gas_fee_computed.as_deref(), Some("1050000"), "fee");
        assert_eq!(row.timestamp, None, "unknown time");
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("out.csv");
        let tmp = dir.path().join("out.csv.tmp");

        let result = write_atomic(&path, &tmp, |tmp| {
            std::fs::write(tmp, "partial")?;
            anyhow::bail!("encoder failed")
        });

        assert!(result.is_err(), "error propagated");
        assert!(!tmp.exists(), "temp file removed");
        assert!(!path.exists(), "nothing committed");
    }

    #[test]
    fn failed_write_keeps_previous_output() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "previous").expect("seed output");

        let result = write_atomic(&path, &path.with_extension("csv.tmp"), |_| {
            anyhow::bail!("encoder failed")
        });

        assert!(result.is_err(), "error propagated");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "previous", "untouched");
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::from_path(Path::new("out.parquet")), Format::Parquet, "parquet");
        assert_eq!(Format::from_path(Path::new("out.PARQUET")), Format::Parquet, "case");
        assert_eq!(Format::from_path(Path::new("out.csv")), Format::Csv, "csv");
        assert_eq!(Format::from_path(Path::new("out")), Format::Csv, "no extension");
    }
}
