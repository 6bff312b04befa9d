//! Chains reachable through the multichain explorer API.
//!
//! One endpoint serves every chain; the `chainid` query parameter picks
//! which ledger is read, so a network here is just an ID plus a name.

use std::fmt;
use std::str::FromStr;

use crate::error::InputError;

/// A chain the explorer indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Network {
    chain_id: u64,
    name: &'static str,
    testnet: bool,
}

impl Network {
    /// Ethereum mainnet.
    pub const ETHEREUM: Self = Self::main(1, "ethereum");
    /// Ethereum Sepolia.
    pub const SEPOLIA: Self = Self::test(11_155_111, "sepolia");
    /// OP mainnet.
    pub const OPTIMISM: Self = Self::main(10, "optimism");
    /// BNB Smart Chain.
    pub const BSC: Self = Self::main(56, "bsc");
    /// BNB Smart Chain testnet.
    pub const BSC_TESTNET: Self = Self::test(97, "bsc-testnet");
    /// Gnosis.
    pub const GNOSIS: Self = Self::main(100, "gnosis");
    /// Polygon PoS.
    pub const POLYGON: Self = Self::main(137, "polygon");
    /// Polygon Amoy.
    pub const POLYGON_AMOY: Self = Self::test(80_002, "polygon-amoy");
    /// Base mainnet.
    pub const BASE: Self = Self::main(8453, "base");
    /// Base Sepolia.
    pub const BASE_SEPOLIA: Self = Self::test(84_532, "base-sepolia");
    /// Arbitrum One.
    pub const ARBITRUM: Self = Self::main(42_161, "arbitrum");
    /// Arbitrum Sepolia.
    pub const ARBITRUM_SEPOLIA: Self = Self::test(421_614, "arbitrum-sepolia");
    /// Scroll mainnet.
    pub const SCROLL: Self = Self::main(534_352, "scroll");

    /// Every known network, mainnets first.
    pub const ALL: &[Self] = &[
        Self::ETHEREUM,
        Self::OPTIMISM,
        Self::BSC,
        Self::GNOSIS,
        Self::POLYGON,
        Self::BASE,
        Self::ARBITRUM,
        Self::SCROLL,
        Self::SEPOLIA,
        Self::BSC_TESTNET,
        Self::POLYGON_AMOY,
        Self::BASE_SEPOLIA,
        Self::ARBITRUM_SEPOLIA,
    ];

    const fn main(chain_id: u64, name: &'static str) -> Self {
        Self {
            chain_id,
            name,
            testnet: false,
        }
    }

    const fn test(chain_id: u64, name: &'static str) -> Self {
        Self {
            chain_id,
            name,
            testnet: true,
        }
    }

    /// EIP-155 chain ID, sent as `chainid`.
    #[must_use]
    pub const fn chain_id(self) -> u64 {
        self.chain_id
    }

    /// Short lower-case name accepted by `--chain`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// Whether this is a test network.
    #[must_use]
    pub const fn is_testnet(self) -> bool {
        self.testnet
    }

    /// Look up a network by chain ID.
    #[must_use]
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::ALL.iter().find(|n| n.chain_id == chain_id).copied()
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::ETHEREUM
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.chain_id)
    }
}

/// Accepts a name (`base`) or a chain ID (`8453`).
impl FromStr for Network {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let found = match s.parse::<u64>() {
            Ok(id) => Self::from_chain_id(id),
            Err(_) => Self::ALL
                .iter()
                .find(|n| n.name.eq_ignore_ascii_case(s))
                .copied(),
        };
        found.ok_or_else(|| InputError::UnknownNetwork(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ids_and_names_are_unique() {
        let ids: HashSet<u64> = Network::ALL.iter().map(|n| n.chain_id()).collect();
        let names: HashSet<&str> = Network::ALL.iter().map(|n| n.name()).collect();
        assert_eq!(ids.len(), Network::ALL.len(), "duplicate chain id");
        assert_eq!(names.len(), Network::ALL.len(), "duplicate name");
    }

    #[test]
    fn parses_name_or_id() {
        assert_eq!("8453".parse::<Network>().ok(), Some(Network::BASE), "id");
        assert_eq!("Base".parse::<Network>().ok(), Some(Network::BASE), "name");
        assert_eq!(Network::from_chain_id(1), Some(Network::default()), "mainnet");
        assert!(
            matches!("31337".parse::<Network>(), Err(InputError::UnknownNetwork(_))),
            "unknown id"
        );
        assert!("mars".parse::<Network>().is_err(), "unknown name");
    }

    #[test]
    fn testnets_are_flagged() {
        assert!(Network::SEPOLIA.is_testnet(), "sepolia");
        assert!(!Network::ETHEREUM.is_testnet(), "mainnet");
        assert_eq!(Network::BASE.to_string(), "base (8453)", "display");
    }
}
