//! Mapping of explorer records onto [`UnifiedRecord`].

use std::collections::HashMap;

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde_json::Value;
use txscan::{ASSUMED_TOKEN_DECIMALS, GasCost, NATIVE_DECIMALS, TokenAmount, UnifiedRecord};

use crate::category::CategorySpec;
use crate::raw::RawRecord;

/// Why a page entry was dropped.
#[derive(Debug, thiserror::Error)]
pub enum MalformedRecord {
    /// The entry is not a record object.
    #[error("not a transfer record: {0}")]
    Shape(#[from] serde_json::Error),
    /// The entry has no transaction hash.
    #[error("record has no transaction hash")]
    MissingHash,
}

/// Symbol and decimals of a token contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    /// Ticker, if any record reported one.
    pub symbol: Option<String>,
    /// Decimal scale applied to amounts.
    pub decimals: u8,
}

/// Token metadata seen during one run, keyed by lower-case contract address.
///
/// Filled from the records themselves; no contract calls are made, so
/// decimals are always [`ASSUMED_TOKEN_DECIMALS`].
#[derive(Debug, Default)]
pub struct TokenMetadataCache {
    entries: HashMap<String, TokenMetadata>,
}

impl TokenMetadataCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached metadata of `contract`.
    #[must_use]
    pub fn get(&self, contract: &str) -> Option<&TokenMetadata> {
        self.entries.get(&contract.to_ascii_lowercase())
    }

    /// Number of contracts seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no contract has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Metadata for `contract`, recording `reported_symbol` on first sight
    /// or when the cached entry has no symbol yet.
    fn resolve(&mut self, contract: &str, reported_symbol: Option<&str>) -> &TokenMetadata {
        let entry = self
            .entries
            .entry(contract.to_ascii_lowercase())
            .or_insert_with(|| TokenMetadata {
                symbol: None,
                decimals: ASSUMED_TOKEN_DECIMALS,
            });
        if entry.symbol.is_none() {
            entry.symbol = reported_symbol.map(str::to_owned);
        }
        entry
    }
}

/// Normalize one page entry of `spec`'s category.
///
/// Never panics. Fields that cannot be interpreted are left empty; only a
/// non-object entry or a missing hash rejects the record.
///
/// # Errors
///
/// Returns [`MalformedRecord`] when the entry cannot be minimally normalized.
pub fn normalize(
    value: &Value,
    spec: &CategorySpec,
    cache: &mut TokenMetadataCache,
) -> Result<UnifiedRecord, MalformedRecord> {
    let raw = RawRecord::from_value(value)?;
    let hash = raw
        .hash
        .as_deref()
        .ok_or(MalformedRecord::MissingHash)?
        .to_ascii_lowercase();

    let (token_symbol, decimals) = match raw.contract_address.as_deref() {
        _ if !spec.carries_token_symbol => (None, NATIVE_DECIMALS),
        Some(contract) => {
            let meta = cache.resolve(contract, raw.token_symbol.as_deref());
            (meta.symbol.clone(), meta.decimals)
        }
        // No contract to key on: only the record's own symbol applies.
        None => (raw.token_symbol.clone(), ASSUMED_TOKEN_DECIMALS),
    };

    let gas = if spec.carries_gas {
        match (parse_amount(raw.gas_used.as_deref()), parse_amount(raw.gas_price.as_deref())) {
            (Some(used), Some(price)) => GasCost::new(used, price),
            _ => None,
        }
    } else {
        None
    };

    Ok(UnifiedRecord {
        hash,
        category: spec.category,
        timestamp: parse_timestamp(raw.time_stamp.as_deref()),
        from: raw.from.unwrap_or_default(),
        to: raw.to.unwrap_or_default(),
        value: parse_amount(raw.value.as_deref()).map(|v| TokenAmount::new(v, decimals)),
        token_id: raw.token_id.filter(|_| spec.carries_token_id),
        token_symbol,
        gas,
    })
}

/// Seconds since the Unix epoch; `None` when unparsable or out of range.
fn parse_timestamp(text: Option<&str>) -> Option<DateTime<Utc>> {
    let seconds = text?.parse::<i64>().ok()?;
    DateTime::from_timestamp(seconds, 0)
}

/// Unsigned decimal (or `0x` hex) integer.
fn parse_amount(text: Option<&str>) -> Option<U256> {
    text?.parse::<U256>().ok()
}
