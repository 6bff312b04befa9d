//! Wallet activity exporter library.
//!
//! Fetches a wallet's external, internal, ERC-20 and ERC-721 transfers from
//! an Etherscan-compatible explorer API, normalizes them into one record
//! schema, drops duplicates, and writes the result as CSV or Parquet.

pub mod category;
pub mod client;
pub mod config;
pub mod cursor;
pub mod dedup;
pub mod export;
pub mod normalize;
pub mod paginator;
pub mod pipeline;
pub mod raw;
