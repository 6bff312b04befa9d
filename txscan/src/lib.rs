//! Domain types for wallet transfer history.
//!
//! An explorer API reports a wallet's activity as four differently shaped
//! lists (external, internal, ERC-20 and ERC-721 transfers). This crate
//! defines the single record schema those lists are normalized into, the
//! identity key used to deduplicate them, and the input types (wallet
//! address, block range, network) a fetch is parameterized by.

mod address;
mod error;
mod networks;
mod types;

pub use address::WalletAddress;
pub use error::InputError;
pub use networks::Network;
pub use types::{
    ASSUMED_TOKEN_DECIMALS, BlockRange, Category, GasCost, IdentityKey, LATEST_BLOCK_SENTINEL,
    NATIVE_DECIMALS, TokenAmount, UnifiedRecord,
};
