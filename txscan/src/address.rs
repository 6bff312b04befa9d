//! Wallet address validation.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;

use crate::InputError;

/// A validated wallet address.
///
/// Accepts exactly `0x` followed by 40 hex digits in any letter case.
/// Checksum casing is not enforced; the explorer API is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletAddress(Address);

impl WalletAddress {
    /// Validate and parse a wallet address.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidAddress`] if the string is not `0x`
    /// followed by 40 hex characters.
    pub fn parse(input: &str) -> Result<Self, InputError> {
        let invalid = || InputError::InvalidAddress(input.to_owned());
        let digits = input.strip_prefix("0x").ok_or_else(invalid)?;
        if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        digits.parse::<Address>().map(Self).map_err(|_| invalid())
    }

    /// The underlying 20-byte address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.0
    }
}

impl FromStr for WalletAddress {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Lower-case `0x`-prefixed hex.
impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
