//! Per-chain confirmation policy and observer operating parameters.
//!
//! Confirmation counts come in a safe and a fast flavour for each direction.
//! A fast count of zero means fast confirmation is disabled; callers must go
//! through [`ConfirmationParams::inbound_confirmation_fast`] and friends
//! rather than read the raw field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use xchain_types::{chain, Chain, ChainId, Decimal};

/// Upper bound for every ticker, in seconds.
pub const MAX_TICKER_SECS: u64 = 300;
/// Upper bound for the outbound schedule interval, in blocks.
pub const MAX_OUTBOUND_SCHEDULE_INTERVAL: i64 = 100;
/// Upper bound for the outbound schedule lookahead, in transactions.
pub const MAX_OUTBOUND_SCHEDULE_LOOKAHEAD: i64 = 500;

/// Default minimum delegation for an observer, in base units.
pub const DEFAULT_MIN_OBSERVER_DELEGATION: u128 = 1_000_000_000_000_000_000_000;

/// Validation failure for chain params, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainParamsError {
    #[error("{field} must be greater than 0")]
    Zero { field: &'static str },

    #[error("{field} ({fast}) cannot exceed {safe_field} ({safe})")]
    FastExceedsSafe {
        field: &'static str,
        fast: u64,
        safe_field: &'static str,
        safe: u64,
    },

    #[error("{field} {value} out of range")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("invalid {field} {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("ballot threshold {0} must be within [0, 1]")]
    Threshold(Decimal),

    #[error("hub chain {0} cannot have observer chain parameters")]
    HubChain(ChainId),

    #[error("chain id {0} not found in chain list")]
    UnknownChain(ChainId),

    #[error("duplicated chain id {0} found")]
    DuplicateChain(ChainId),
}

impl ChainParamsError {
    /// Name of the field that failed validation.
    pub fn field(&self) -> &'static str {
        match self {
            ChainParamsError::Zero { field }
            | ChainParamsError::FastExceedsSafe { field, .. }
            | ChainParamsError::OutOfRange { field, .. }
            | ChainParamsError::InvalidAddress { field, .. } => field,
            ChainParamsError::Threshold(_) => "ballot_threshold",
            ChainParamsError::HubChain(_)
            | ChainParamsError::UnknownChain(_)
            | ChainParamsError::DuplicateChain(_) => "chain_id",
        }
    }
}

/// Block confirmations required before an observation is reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationParams {
    pub safe_inbound_count: u64,
    /// Zero disables fast inbound confirmation.
    pub fast_inbound_count: u64,
    pub safe_outbound_count: u64,
    /// Zero disables fast outbound confirmation.
    pub fast_outbound_count: u64,
}

impl ConfirmationParams {
    /// Same counts in both directions, fast confirmation disabled.
    pub fn safe_only(inbound: u64, outbound: u64) -> Self {
        Self {
            safe_inbound_count: inbound,
            fast_inbound_count: 0,
            safe_outbound_count: outbound,
            fast_outbound_count: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ChainParamsError> {
        check_pair(
            "safe_inbound_count",
            self.safe_inbound_count,
            "fast_inbound_count",
            self.fast_inbound_count,
        )?;
        check_pair(
            "safe_outbound_count",
            self.safe_outbound_count,
            "fast_outbound_count",
            self.fast_outbound_count,
        )
    }

    /// Fast inbound count, falling back to the safe count when disabled.
    pub fn inbound_confirmation_fast(&self) -> u64 {
        if self.fast_inbound_count > 0 {
            self.fast_inbound_count
        } else {
            self.safe_inbound_count
        }
    }

    pub fn inbound_confirmation_safe(&self) -> u64 {
        self.safe_inbound_count
    }

    /// Fast outbound count, falling back to the safe count when disabled.
    pub fn outbound_confirmation_fast(&self) -> u64 {
        if self.fast_outbound_count > 0 {
            self.fast_outbound_count
        } else {
            self.safe_outbound_count
        }
    }

    pub fn outbound_confirmation_safe(&self) -> u64 {
        self.safe_outbound_count
    }

    /// True iff `0 < fast < safe`; a fast count equal to safe gains nothing.
    pub fn is_inbound_fast_confirmation_enabled(&self) -> bool {
        self.fast_inbound_count > 0 && self.fast_inbound_count < self.safe_inbound_count
    }

    pub fn is_outbound_fast_confirmation_enabled(&self) -> bool {
        self.fast_outbound_count > 0 && self.fast_outbound_count < self.safe_outbound_count
    }
}

fn check_pair(
    safe_field: &'static str,
    safe: u64,
    fast_field: &'static str,
    fast: u64,
) -> Result<(), ChainParamsError> {
    if safe == 0 {
        return Err(ChainParamsError::Zero { field: safe_field });
    }
    if fast > safe {
        return Err(ChainParamsError::FastExceedsSafe {
            field: fast_field,
            fast,
            safe_field,
            safe,
        });
    }
    Ok(())
}

/// Everything observers need to know to watch one external chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    pub chain_id: ChainId,
    pub confirmation_params: ConfirmationParams,
    /// Empty when the chain has no such contract.
    #[serde(default)]
    pub token_contract_address: String,
    #[serde(default)]
    pub connector_contract_address: String,
    #[serde(default)]
    pub erc20_custody_contract_address: String,
    #[serde(default)]
    pub gateway_address: String,
    pub inbound_ticker: u64,
    pub outbound_ticker: u64,
    /// Zero when the chain has no UTXO set to watch.
    #[serde(default)]
    pub watch_utxo_ticker: u64,
    pub gas_price_ticker: u64,
    pub outbound_schedule_interval: i64,
    pub outbound_schedule_lookahead: i64,
    pub ballot_threshold: Decimal,
    pub min_observer_delegation: u128,
    pub is_supported: bool,
}

impl ChainParams {
    /// Entry-level checks; registry membership is checked by [`ChainParamsList::validate`].
    pub fn validate(&self) -> Result<(), ChainParamsError> {
        if chain::is_hub_chain(self.chain_id) {
            return Err(ChainParamsError::HubChain(self.chain_id));
        }
        self.confirmation_params.validate()?;

        check_ticker("gas_price_ticker", self.gas_price_ticker, false)?;
        check_ticker("inbound_ticker", self.inbound_ticker, false)?;
        check_ticker("outbound_ticker", self.outbound_ticker, false)?;
        check_ticker("watch_utxo_ticker", self.watch_utxo_ticker, true)?;

        if !(1..=MAX_OUTBOUND_SCHEDULE_INTERVAL).contains(&self.outbound_schedule_interval) {
            return Err(ChainParamsError::OutOfRange {
                field: "outbound_schedule_interval",
                value: self.outbound_schedule_interval,
            });
        }
        if !(1..=MAX_OUTBOUND_SCHEDULE_LOOKAHEAD).contains(&self.outbound_schedule_lookahead) {
            return Err(ChainParamsError::OutOfRange {
                field: "outbound_schedule_lookahead",
                value: self.outbound_schedule_lookahead,
            });
        }

        check_contract("token_contract_address", &self.token_contract_address)?;
        check_contract("connector_contract_address", &self.connector_contract_address)?;
        check_contract("erc20_custody_contract_address", &self.erc20_custody_contract_address)?;
        if Chain::from_id(self.chain_id).is_some_and(Chain::is_evm) {
            check_contract("gateway_address", &self.gateway_address)?;
        }

        if !self.ballot_threshold.is_fraction() {
            return Err(ChainParamsError::Threshold(self.ballot_threshold));
        }
        Ok(())
    }
}

fn check_ticker(
    field: &'static str,
    value: u64,
    zero_allowed: bool,
) -> Result<(), ChainParamsError> {
    if (value == 0 && !zero_allowed) || value > MAX_TICKER_SECS {
        return Err(ChainParamsError::OutOfRange {
            field,
            value: value.min(i64::MAX as u64) as i64,
        });
    }
    Ok(())
}

/// Empty, or a `0x`-prefixed 20-byte hex address.
fn check_contract(field: &'static str, value: &str) -> Result<(), ChainParamsError> {
    if value.is_empty() || is_hex_address(value) {
        return Ok(());
    }
    Err(ChainParamsError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

fn is_hex_address(value: &str) -> bool {
    match value.strip_prefix("0x") {
        Some(hex) => hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Chain params for every external chain, at most one entry per chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParamsList {
    pub chain_params: Vec<ChainParams>,
}

impl ChainParamsList {
    pub fn new(chain_params: Vec<ChainParams>) -> Self {
        Self { chain_params }
    }

    /// Check each entry in list order: entry validation, then registry
    /// membership, then duplicate chain id. The first error wins.
    pub fn validate(&self) -> Result<(), ChainParamsError> {
        let mut seen = BTreeSet::new();
        for params in &self.chain_params {
            params.validate()?;
            let known = Chain::from_id(params.chain_id).is_some_and(|c| c.is_external);
            if !known {
                return Err(ChainParamsError::UnknownChain(params.chain_id));
            }
            if !seen.insert(params.chain_id) {
                return Err(ChainParamsError::DuplicateChain(params.chain_id));
            }
        }
        Ok(())
    }

    pub fn get(&self, chain_id: ChainId) -> Option<&ChainParams> {
        self.chain_params.iter().find(|p| p.chain_id == chain_id)
    }

    /// Params for `chain_id` if the chain is currently supported.
    pub fn get_supported(&self, chain_id: ChainId) -> Option<&ChainParams> {
        self.get(chain_id).filter(|p| p.is_supported)
    }

    /// Replace the entry for the same chain, or append a new one.
    pub fn upsert(&mut self, params: ChainParams) {
        match self.chain_params.iter_mut().find(|p| p.chain_id == params.chain_id) {
            Some(existing) => *existing = params,
            None => self.chain_params.push(params),
        }
    }

    /// Remove the entry for `chain_id`, returning whether one existed.
    pub fn remove(&mut self, chain_id: ChainId) -> bool {
        let before = self.chain_params.len();
        self.chain_params.retain(|p| p.chain_id != chain_id);
        self.chain_params.len() != before
    }

    pub fn supported_chains(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.chain_params
            .iter()
            .filter(|p| p.is_supported)
            .map(|p| p.chain_id)
    }
}

// ── Defaults ───────────────────────────────────────────────────────────

const EVM_ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

fn evm_defaults(
    chain: &Chain,
    confirmations: u64,
    inbound_ticker: u64,
    threshold: Decimal,
) -> ChainParams {
    ChainParams {
        chain_id: chain.chain_id,
        confirmation_params: ConfirmationParams::safe_only(confirmations, confirmations),
        token_contract_address: EVM_ZERO_ADDRESS.to_string(),
        connector_contract_address: EVM_ZERO_ADDRESS.to_string(),
        erc20_custody_contract_address: EVM_ZERO_ADDRESS.to_string(),
        gateway_address: String::new(),
        inbound_ticker,
        outbound_ticker: 15,
        watch_utxo_ticker: 0,
        gas_price_ticker: 30,
        outbound_schedule_interval: 30,
        outbound_schedule_lookahead: 60,
        ballot_threshold: threshold,
        min_observer_delegation: DEFAULT_MIN_OBSERVER_DELEGATION,
        is_supported: false,
    }
}

fn btc_defaults(chain: &Chain, confirmations: u64, threshold: Decimal) -> ChainParams {
    ChainParams {
        chain_id: chain.chain_id,
        confirmation_params: ConfirmationParams::safe_only(confirmations, confirmations),
        token_contract_address: String::new(),
        connector_contract_address: String::new(),
        erc20_custody_contract_address: String::new(),
        gateway_address: String::new(),
        inbound_ticker: 120,
        outbound_ticker: 60,
        watch_utxo_ticker: 30,
        gas_price_ticker: 30,
        outbound_schedule_interval: 30,
        outbound_schedule_lookahead: 60,
        ballot_threshold: threshold,
        min_observer_delegation: DEFAULT_MIN_OBSERVER_DELEGATION,
        is_supported: false,
    }
}

/// Default params for the well-known external chains, all unsupported until
/// switched on.
pub fn default_chain_params(threshold: Decimal) -> ChainParamsList {
    ChainParamsList::new(vec![
        evm_defaults(&Chain::ETHEREUM, 14, 12, threshold),
        evm_defaults(&Chain::BSC_MAINNET, 14, 5, threshold),
        btc_defaults(&Chain::BITCOIN_MAINNET, 2, threshold),
        evm_defaults(&Chain::GOERLI, 6, 12, threshold),
        evm_defaults(&Chain::BSC_TESTNET, 6, 5, threshold),
        evm_defaults(&Chain::MUMBAI, 12, 2, threshold),
        btc_defaults(&Chain::BITCOIN_TESTNET, 2, threshold),
        btc_defaults(&Chain::BITCOIN_REGTEST, 1, threshold),
        evm_defaults(&Chain::GOERLI_LOCALNET, 1, 2, threshold),
    ])
}
