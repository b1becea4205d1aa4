//! Canonical chain registry.
//!
//! Every chain the observer set may watch, plus the hub chain the observer
//! module itself runs on. Chain params, ballots and header-verification flags
//! all key off [`ChainId`]s that must resolve here.

use crate::error::XchainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// EIP-155 style numeric chain identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainId(i64);

impl ChainId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Big-endian bytes, used for storage keys and digests.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChainId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// The network a chain belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Network {
    /// The hub chain running the observer module.
    Hub,
    Eth,
    Bsc,
    Btc,
    Polygon,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NetworkType {
    Mainnet,
    Testnet,
    Privnet,
    Devnet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vm {
    NoVm,
    Evm,
}

/// Consensus family, which decides the block-header verification flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Consensus {
    Ethereum,
    Tendermint,
    Bitcoin,
}

/// A chain in the canonical registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chain {
    pub chain_id: ChainId,
    pub name: &'static str,
    pub network: Network,
    pub network_type: NetworkType,
    pub vm: Vm,
    pub consensus: Consensus,
    /// Whether the chain is external to the hub (observers watch it).
    pub is_external: bool,
    /// Whether block headers of this chain can be verified on the hub.
    pub is_header_supported: bool,
}

const fn chain(
    id: i64,
    name: &'static str,
    network: Network,
    network_type: NetworkType,
    vm: Vm,
    consensus: Consensus,
    is_header_supported: bool,
) -> Chain {
    Chain {
        chain_id: ChainId::new(id),
        name,
        network,
        network_type,
        vm,
        consensus,
        is_external: !matches!(network, Network::Hub),
        is_header_supported,
    }
}

use Consensus::{Bitcoin, Ethereum, Tendermint};
use Network::{Bsc, Btc, Eth, Hub, Polygon};
use NetworkType::{Devnet, Mainnet, Privnet, Testnet};
use Vm::{Evm, NoVm};

impl Chain {
    pub const HUB_MAINNET: Chain = chain(7000, "hub_mainnet", Hub, Mainnet, Evm, Tendermint, false);
    pub const HUB_TESTNET: Chain = chain(7001, "hub_testnet", Hub, Testnet, Evm, Tendermint, false);
    pub const HUB_MOCKNET: Chain = chain(70000, "hub_mocknet", Hub, Devnet, Evm, Tendermint, false);
    pub const HUB_PRIVNET: Chain = chain(101, "hub_privnet", Hub, Privnet, Evm, Tendermint, false);

    pub const ETHEREUM: Chain = chain(1, "eth_mainnet", Eth, Mainnet, Evm, Ethereum, true);
    pub const BSC_MAINNET: Chain = chain(56, "bsc_mainnet", Bsc, Mainnet, Evm, Ethereum, true);
    pub const BITCOIN_MAINNET: Chain =
        chain(8332, "btc_mainnet", Btc, Mainnet, NoVm, Bitcoin, true);
    pub const POLYGON: Chain =
        chain(137, "polygon_mainnet", Polygon, Mainnet, Evm, Ethereum, false);

    pub const SEPOLIA: Chain =
        chain(11155111, "sepolia_testnet", Eth, Testnet, Evm, Ethereum, true);
    pub const GOERLI: Chain = chain(5, "goerli_testnet", Eth, Testnet, Evm, Ethereum, true);
    pub const BSC_TESTNET: Chain = chain(97, "bsc_testnet", Bsc, Testnet, Evm, Ethereum, true);
    pub const BITCOIN_TESTNET: Chain =
        chain(18332, "btc_testnet", Btc, Testnet, NoVm, Bitcoin, true);
    pub const MUMBAI: Chain =
        chain(80001, "mumbai_testnet", Polygon, Testnet, Evm, Ethereum, false);
    pub const AMOY: Chain = chain(80002, "amoy_testnet", Polygon, Testnet, Evm, Ethereum, false);

    pub const BITCOIN_REGTEST: Chain =
        chain(18444, "btc_regtest", Btc, Privnet, NoVm, Bitcoin, true);
    pub const GOERLI_LOCALNET: Chain =
        chain(1337, "goerli_localnet", Eth, Privnet, Evm, Ethereum, true);

    /// The full canonical registry.
    pub fn all() -> &'static [Chain] {
        &REGISTRY
    }

    /// Look up a chain in the canonical registry.
    pub fn from_id(id: ChainId) -> Option<&'static Chain> {
        REGISTRY.iter().find(|c| c.chain_id == id)
    }

    /// Like [`Chain::from_id`], as an error for validation paths.
    pub fn require(id: ChainId) -> Result<&'static Chain, XchainError> {
        Self::from_id(id).ok_or(XchainError::UnknownChain(id.as_i64()))
    }

    /// Chains external to the hub, in registry order.
    pub fn external() -> impl Iterator<Item = &'static Chain> {
        REGISTRY.iter().filter(|c| c.is_external)
    }

    pub fn is_hub(&self) -> bool {
        self.network == Network::Hub
    }

    pub fn is_evm(&self) -> bool {
        self.vm == Vm::Evm
    }

    /// Chains whose headers follow Ethereum-style consensus.
    pub fn is_eth_type(&self) -> bool {
        self.consensus == Consensus::Ethereum
    }

    /// Chains whose headers follow Bitcoin-style proof of work.
    pub fn is_btc_type(&self) -> bool {
        self.consensus == Consensus::Bitcoin
    }
}

static REGISTRY: [Chain; 16] = [
    Chain::BITCOIN_MAINNET,
    Chain::BSC_MAINNET,
    Chain::ETHEREUM,
    Chain::BITCOIN_TESTNET,
    Chain::MUMBAI,
    Chain::AMOY,
    Chain::BSC_TESTNET,
    Chain::GOERLI,
    Chain::SEPOLIA,
    Chain::BITCOIN_REGTEST,
    Chain::GOERLI_LOCALNET,
    Chain::HUB_MAINNET,
    Chain::HUB_TESTNET,
    Chain::HUB_MOCKNET,
    Chain::HUB_PRIVNET,
    Chain::POLYGON,
];

/// Whether `id` names a hub chain. Unknown ids are not hub chains.
pub fn is_hub_chain(id: ChainId) -> bool {
    Chain::from_id(id).is_some_and(Chain::is_hub)
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_ids_are_unique() {
        let ids: HashSet<ChainId> = Chain::all().iter().map(|c| c.chain_id).collect();
        assert_eq!(ids.len(), Chain::all().len());
    }

    #[test]
    fn from_id_finds_known_chains() {
        assert_eq!(Chain::from_id(ChainId::new(1)), Some(&Chain::ETHEREUM));
        assert_eq!(Chain::from_id(ChainId::new(18444)), Some(&Chain::BITCOIN_REGTEST));
        assert!(Chain::from_id(ChainId::new(999_999)).is_none());
    }

    #[test]
    fn require_reports_unknown_chain() {
        assert_eq!(
            Chain::require(ChainId::new(42)),
            Err(XchainError::UnknownChain(42))
        );
    }

    #[test]
    fn hub_chains_are_not_external() {
        for c in Chain::all().iter() {
            assert_eq!(c.is_external, !c.is_hub(), "{c}");
        }
        assert!(is_hub_chain(ChainId::new(7000)));
        assert!(!is_hub_chain(ChainId::new(1)));
        assert!(!is_hub_chain(ChainId::new(123_456)));
    }

    #[test]
    fn consensus_families() {
        assert!(Chain::ETHEREUM.is_eth_type());
        assert!(!Chain::ETHEREUM.is_btc_type());
        assert!(Chain::BITCOIN_TESTNET.is_btc_type());
        assert!(!Chain::BITCOIN_TESTNET.is_evm());
    }

    #[test]
    fn external_iterator_skips_hub() {
        assert!(Chain::external().all(|c| !c.is_hub()));
        assert_eq!(Chain::external().count(), 12);
    }
}
