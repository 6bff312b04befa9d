//! The unified record schema and its supporting value types.

use std::fmt;

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::InputError;

/// Block number standing in for "latest" when no end block is given.
///
/// This is a fixed, very large sentinel rather than the chain height; the
/// explorer clamps it to its own tip. Pass an explicit end block to pin a
/// range.
pub const LATEST_BLOCK_SENTINEL: u64 = 99_999_999;

/// Decimals of the native currency (wei per ether).
pub const NATIVE_DECIMALS: u8 = 18;

/// Decimals assumed for every ERC-20/721 amount.
///
/// Token decimals are not read from the token contract, so amounts of tokens
/// with other decimals are scaled incorrectly. Known simplification.
pub const ASSUMED_TOKEN_DECIMALS: u8 = 18;

/// Transaction category, one per explorer list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Plain transactions sent from or to the wallet.
    External,
    /// Value transfers made by contract execution.
    Internal,
    /// ERC-20 token transfers.
    #[serde(rename = "ERC20")]
    Erc20,
    /// ERC-721 token transfers.
    #[serde(rename = "ERC721")]
    Erc721,
}

impl Category {
    /// All categories in fetch order.
    pub const ALL: [Self; 4] = [Self::External, Self::Internal, Self::Erc20, Self::Erc721];

    /// The label written to the `type` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::External => "External",
            Self::Internal => "Internal",
            Self::Erc20 => "ERC20",
            Self::Erc721 => "ERC721",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An integer amount in base units together with its decimal scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount {
    raw: U256,
    decimals: u8,
}

impl TokenAmount {
    /// Create an amount of `raw` base units scaled by `10^decimals`.
    #[must_use]
    pub const fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// The unscaled amount in base units.
    #[must_use]
    pub const fn raw(&self) -> U256 {
        self.raw
    }

    /// The decimal scale.
    #[must_use]
    pub const fn decimals(&self) -> u8 {
        self.decimals
    }
}

/// Plain decimal notation with trailing zeros trimmed, keeping at least one
/// fractional digit (`1000000000000000000` at 18 decimals is `1.0`).
impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.decimals == 0 {
            return write!(f, "{}", self.raw);
        }
        let scale = U256::from(10u8).pow(U256::from(self.decimals));
        let (whole, frac) = self.raw.div_rem(scale);
        let frac = format!("{:0>width$}", frac.to_string(), width = usize::from(self.decimals));
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            write!(f, "{whole}.0")
        } else {
            write!(f, "{whole}.{frac}")
        }
    }
}

/// Gas accounting of a transaction, in gas units and wei.
///
/// Only exists when both `used` and `price` were reported; a missing value is
/// never stood in for by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasCost {
    /// Gas units consumed.
    pub used: U256,
    /// Price per gas unit in wei.
    pub price: U256,
    /// `used * price` in wei.
    pub fee: U256,
}

impl GasCost {
    /// Build a gas cost, computing the fee as `used * price`.
    ///
    /// Returns `None` if the fee does not fit in 256 bits.
    #[must_use]
    pub fn new(used: U256, price: U256) -> Option<Self> {
        let fee = used.checked_mul(price)?;
        Some(Self { used, price, fee })
    }
}

/// One transfer event normalized from any category's raw record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifiedRecord {
    /// Transaction hash, lower-case. One hash may carry several records.
    pub hash: String,
    /// Which list the record came from.
    pub category: Category,
    /// Block time; `None` when the source timestamp was missing or invalid.
    pub timestamp: Option<DateTime<Utc>>,
    /// Sender address.
    pub from: String,
    /// Recipient address; empty for contract creations.
    pub to: String,
    /// Transferred amount, if the source reported one.
    pub value: Option<TokenAmount>,
    /// ERC-721 token ID.
    pub token_id: Option<String>,
    /// ERC-20/721 token symbol.
    pub token_symbol: Option<String>,
    /// Gas accounting, External/Internal only.
    pub gas: Option<GasCost>,
}

impl UnifiedRecord {
    /// The composite key under which this record is deduplicated.
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            hash: self.hash.clone(),
            category: self.category,
            token_id: self.token_id.clone().unwrap_or_default(),
        }
    }
}

/// `(hash, type, tokenId-or-empty)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    /// Transaction hash.
    pub hash: String,
    /// Record category.
    pub category: Category,
    /// Token ID, or the empty string when the record has none.
    pub token_id: String,
}

/// An inclusive range of block numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    start: u64,
    end: u64,
}

impl BlockRange {
    /// Create the range `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidBlockRange`] if `start > end`.
    pub const fn new(start: u64, end: u64) -> Result<Self, InputError> {
        if start > end {
            return Err(InputError::InvalidBlockRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// First block, inclusive.
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Last block, inclusive.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.end
    }
}

/// Genesis to [`LATEST_BLOCK_SENTINEL`].
impl Default for BlockRange {
    fn default() -> Self {
        Self {
            start: 0,
            end: LATEST_BLOCK_SENTINEL,
        }
    }
}
