//! Input validation errors.

/// Rejected run input. Raised before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// The wallet address is not `0x` followed by 40 hex characters.
    #[error("invalid wallet address {0:?}: expected 0x followed by 40 hex characters")]
    InvalidAddress(String),

    /// The block range is empty (`start > end`).
    #[error("invalid block range: start block {start} is after end block {end}")]
    InvalidBlockRange {
        /// First block of the requested range.
        start: u64,
        /// Last block of the requested range.
        end: u64,
    },

    /// The chain is not one of the known networks.
    #[error("unknown network {0:?}; run `txscan-export chains` for the list")]
    UnknownNetwork(String),
}
