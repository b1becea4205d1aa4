//! Crosschain control flags and operational flags.
//!
//! Crosschain flags switch inbound and outbound processing and carry the gas
//! price escalation policy. Operational flags carry node-level knobs that the
//! observer clients read: a coordinated restart height, a signer block-time
//! offset and a minimum client version.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::authority::PolicyTier;

/// Largest allowed signer block-time offset, in milliseconds.
pub const MAX_SIGNER_BLOCK_TIME_OFFSET_MS: i64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagsError {
    #[error("epoch length must be positive, got {0}")]
    NonPositiveEpochLength(i64),

    #[error("retry interval must be positive")]
    NonPositiveRetryInterval,

    #[error("restart height cannot be negative, got {0}")]
    NegativeRestartHeight(i64),

    #[error("signer block time offset cannot be negative, got {0}ms")]
    NegativeSignerBlockTimeOffset(i64),

    #[error("signer block time offset {0}ms exceeds the 10000ms limit")]
    SignerBlockTimeOffsetLimit(i64),

    #[error("invalid minimum version {0:?}")]
    InvalidMinimumVersion(String),
}

/// How pending outbound gas prices are bumped when transactions stall.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPriceIncreaseFlags {
    /// Blocks between escalation rounds.
    pub epoch_length: i64,
    /// Minimum age of a pending transaction before its gas price is raised.
    pub retry_interval: Duration,
    /// Percentage added to the median gas price each round.
    pub gas_price_increase_percent: u32,
    /// Cap on the total increase, as a percentage of the median gas price.
    pub gas_price_increase_max: u32,
    /// Pending transactions considered per round.
    pub max_pending_cctxs: u32,
}

impl GasPriceIncreaseFlags {
    pub fn validate(&self) -> Result<(), FlagsError> {
        if self.epoch_length <= 0 {
            return Err(FlagsError::NonPositiveEpochLength(self.epoch_length));
        }
        if self.retry_interval.is_zero() {
            return Err(FlagsError::NonPositiveRetryInterval);
        }
        Ok(())
    }
}

impl Default for GasPriceIncreaseFlags {
    fn default() -> Self {
        Self {
            epoch_length: 100,
            retry_interval: Duration::from_secs(600),
            gas_price_increase_percent: 100,
            gas_price_increase_max: 500,
            max_pending_cctxs: 500,
        }
    }
}

/// Which consensus families may have their block headers verified on the hub.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeaderVerificationFlags {
    pub is_eth_type_chain_enabled: bool,
    pub is_btc_type_chain_enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrosschainFlags {
    pub is_inbound_enabled: bool,
    pub is_outbound_enabled: bool,
    pub gas_price_increase_flags: Option<GasPriceIncreaseFlags>,
    pub block_header_verification_flags: Option<BlockHeaderVerificationFlags>,
}

impl Default for CrosschainFlags {
    fn default() -> Self {
        Self {
            is_inbound_enabled: true,
            is_outbound_enabled: true,
            gas_price_increase_flags: Some(GasPriceIncreaseFlags::default()),
            block_header_verification_flags: Some(BlockHeaderVerificationFlags::default()),
        }
    }
}

impl CrosschainFlags {
    pub fn validate(&self) -> Result<(), FlagsError> {
        match &self.gas_price_increase_flags {
            Some(gas) => gas.validate(),
            None => Ok(()),
        }
    }

    /// Header verification for Ethereum-type chains.
    pub fn is_eth_type_header_verification_enabled(&self) -> bool {
        self.block_header_verification_flags
            .is_some_and(|f| f.is_eth_type_chain_enabled)
    }

    /// Header verification for Bitcoin-type chains.
    pub fn is_btc_type_header_verification_enabled(&self) -> bool {
        self.block_header_verification_flags
            .is_some_and(|f| f.is_btc_type_chain_enabled)
    }

    /// What moving from `self` to `next` changes.
    pub fn diff(&self, next: &CrosschainFlags) -> FlagsChange {
        let headers = |f: &CrosschainFlags| f.block_header_verification_flags.unwrap_or_default();
        let (old_h, new_h) = (headers(self), headers(next));
        FlagsChange {
            inbound: Toggle::between(self.is_inbound_enabled, next.is_inbound_enabled),
            outbound: Toggle::between(self.is_outbound_enabled, next.is_outbound_enabled),
            eth_header_verification: Toggle::between(
                old_h.is_eth_type_chain_enabled,
                new_h.is_eth_type_chain_enabled,
            ),
            btc_header_verification: Toggle::between(
                old_h.is_btc_type_chain_enabled,
                new_h.is_btc_type_chain_enabled,
            ),
            gas_price_policy_changed: self.gas_price_increase_flags
                != next.gas_price_increase_flags,
        }
    }
}

/// How one boolean switch moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    Unchanged,
    Enabled,
    Disabled,
}

impl Toggle {
    fn between(old: bool, new: bool) -> Self {
        match (old, new) {
            (false, true) => Toggle::Enabled,
            (true, false) => Toggle::Disabled,
            _ => Toggle::Unchanged,
        }
    }
}

/// The sub-fields a crosschain flags update touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlagsChange {
    pub inbound: Toggle,
    pub outbound: Toggle,
    pub eth_header_verification: Toggle,
    pub btc_header_verification: Toggle,
    pub gas_price_policy_changed: bool,
}

impl FlagsChange {
    pub fn enables_anything(&self) -> bool {
        [
            self.inbound,
            self.outbound,
            self.eth_header_verification,
            self.btc_header_verification,
        ]
        .contains(&Toggle::Enabled)
    }

    /// Emergency tier suffices when the update only switches things off.
    pub fn required_tier(&self) -> PolicyTier {
        if self.enables_anything() || self.gas_price_policy_changed {
            PolicyTier::Operational
        } else {
            PolicyTier::Emergency
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalFlags {
    /// Height at which observer clients restart; zero for none.
    pub restart_height: i64,
    /// Delay signers add after a new block before signing, in milliseconds.
    pub signer_block_time_offset_ms: Option<i64>,
    /// Oldest client version allowed to run; empty for no constraint.
    #[serde(default)]
    pub minimum_version: String,
}

impl OperationalFlags {
    pub fn validate(&self) -> Result<(), FlagsError> {
        if self.restart_height < 0 {
            return Err(FlagsError::NegativeRestartHeight(self.restart_height));
        }
        if let Some(offset) = self.signer_block_time_offset_ms {
            if offset < 0 {
                return Err(FlagsError::NegativeSignerBlockTimeOffset(offset));
            }
            if offset > MAX_SIGNER_BLOCK_TIME_OFFSET_MS {
                return Err(FlagsError::SignerBlockTimeOffsetLimit(offset));
            }
        }
        if !self.minimum_version.is_empty() && !is_valid_version(&self.minimum_version) {
            return Err(FlagsError::InvalidMinimumVersion(self.minimum_version.clone()));
        }
        Ok(())
    }
}

/// `v` followed by one to three dot-separated numbers and an optional
/// `-pre` / `+build` suffix, e.g. `v21`, `v21.0.1`, `v22.0.0-rc1`.
fn is_valid_version(version: &str) -> bool {
    let Some(rest) = version.strip_prefix('v') else {
        return false;
    };
    let (core, suffix) = match rest.find(|c| c == '-' || c == '+') {
        Some(i) => (&rest[..i], Some(&rest[i + 1..])),
        None => (rest, None),
    };
    let parts: Vec<&str> = core.split('.').collect();
    let core_ok = (1..=3).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
    let suffix_ok = suffix.map_or(true, |s| {
        !s.is_empty()
            && s
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'+'))
    });
    core_ok && suffix_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_flags_require_positive_epoch_and_interval() {
        let mut f = GasPriceIncreaseFlags::default();
        assert!(f.validate().is_ok());
        f.epoch_length = 0;
        assert_eq!(f.validate(), Err(FlagsError::NonPositiveEpochLength(0)));

        let mut f = GasPriceIncreaseFlags::default();
        f.retry_interval = Duration::ZERO;
        assert_eq!(f.validate(), Err(FlagsError::NonPositiveRetryInterval));
    }

    #[test]
    fn gas_percentages_may_be_zero() {
        let f = GasPriceIncreaseFlags {
            gas_price_increase_percent: 0,
            gas_price_increase_max: 0,
            max_pending_cctxs: 0,
            ..GasPriceIncreaseFlags::default()
        };
        assert!(f.validate().is_ok());
    }

    #[test]
    fn crosschain_flags_validate_gas_policy() {
        let mut flags = CrosschainFlags::default();
        assert!(flags.validate().is_ok());
        flags.gas_price_increase_flags = None;
        assert!(flags.validate().is_ok());
        flags.gas_price_increase_flags = Some(GasPriceIncreaseFlags {
            epoch_length: -1,
            ..GasPriceIncreaseFlags::default()
        });
        assert!(flags.validate().is_err());
    }

    #[test]
    fn disabling_only_needs_emergency_tier() {
        let current = CrosschainFlags::default();
        let next = CrosschainFlags {
            is_inbound_enabled: false,
            is_outbound_enabled: false,
            ..current.clone()
        };
        let change = current.diff(&next);
        assert_eq!(change.inbound, Toggle::Disabled);
        assert_eq!(change.required_tier(), PolicyTier::Emergency);
    }

    #[test]
    fn enabling_needs_operational_tier() {
        let current = CrosschainFlags {
            is_inbound_enabled: false,
            ..CrosschainFlags::default()
        };
        let change = current.diff(&CrosschainFlags::default());
        assert_eq!(change.inbound, Toggle::Enabled);
        assert_eq!(change.required_tier(), PolicyTier::Operational);
    }

    #[test]
    fn gas_policy_change_needs_operational_tier() {
        let current = CrosschainFlags::default();
        let next = CrosschainFlags {
            gas_price_increase_flags: Some(GasPriceIncreaseFlags {
                epoch_length: 50,
                ..GasPriceIncreaseFlags::default()
            }),
            ..current.clone()
        };
        let change = current.diff(&next);
        assert!(change.gas_price_policy_changed);
        assert!(!change.enables_anything());
        assert_eq!(change.required_tier(), PolicyTier::Operational);
    }

    #[test]
    fn header_verification_by_consensus_family() {
        let mut flags = CrosschainFlags::default();
        assert!(!flags.is_eth_type_header_verification_enabled());
        flags.block_header_verification_flags = Some(BlockHeaderVerificationFlags {
            is_eth_type_chain_enabled: true,
            is_btc_type_chain_enabled: false,
        });
        assert!(flags.is_eth_type_header_verification_enabled());
        assert!(!flags.is_btc_type_header_verification_enabled());
        let change = CrosschainFlags::default().diff(&flags);
        assert_eq!(change.eth_header_verification, Toggle::Enabled);
        assert_eq!(change.required_tier(), PolicyTier::Operational);
    }

    #[test]
    fn no_op_update_is_emergency_tier() {
        let flags = CrosschainFlags::default();
        assert_eq!(flags.diff(&flags).required_tier(), PolicyTier::Emergency);
    }

    #[test]
    fn operational_flags_restart_height() {
        let flags = OperationalFlags {
            restart_height: -1,
            ..OperationalFlags::default()
        };
        assert_eq!(flags.validate(), Err(FlagsError::NegativeRestartHeight(-1)));
        assert!(OperationalFlags::default().validate().is_ok());
    }

    #[test]
    fn signer_offset_errors_are_distinct() {
        let neg = OperationalFlags {
            signer_block_time_offset_ms: Some(-1),
            ..OperationalFlags::default()
        };
        assert_eq!(neg.validate(), Err(FlagsError::NegativeSignerBlockTimeOffset(-1)));

        let over = OperationalFlags {
            signer_block_time_offset_ms: Some(10_001),
            ..OperationalFlags::default()
        };
        assert_eq!(over.validate(), Err(FlagsError::SignerBlockTimeOffsetLimit(10_001)));

        let edge = OperationalFlags {
            signer_block_time_offset_ms: Some(10_000),
            ..OperationalFlags::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn minimum_version_format() {
        for ok in ["v21", "v21.0.1", "v22.0.0-rc1", "v1.2.3+build.7"] {
            assert!(is_valid_version(ok), "{ok}");
        }
        for bad in ["21.0.0", "v", "v1..2", "v1.2.3.4", "v1.2-", "vx.1"] {
            assert!(!is_valid_version(bad), "{bad}");
        }
        let flags = OperationalFlags {
            minimum_version: "latest".to_string(),
            ..OperationalFlags::default()
        };
        assert!(matches!(flags.validate(), Err(FlagsError::InvalidMinimumVersion(_))));
    }
}
