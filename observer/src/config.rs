//! Observer module configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use xchain_types::Decimal;

use crate::logging::LogFormat;
use crate::ObserverError;

/// Configuration for the observer module.
///
/// Can be loaded from a TOML file via [`ObserverConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Ballot threshold given to default chain params.
    #[serde(default = "default_ballot_threshold")]
    pub default_ballot_threshold: Decimal,

    /// Blocks after creation before a ballot is settled and swept.
    #[serde(default = "default_ballot_maturity_blocks")]
    pub ballot_maturity_blocks: i64,

    /// Extra blocks an unfinalized ballot is kept past maturity before it is
    /// force-deleted.
    #[serde(default = "default_pending_ballots_deletion_buffer_blocks")]
    pub pending_ballots_deletion_buffer_blocks: i64,

    /// Amount taken from an observer whose votes on matured ballots missed
    /// the outcome, in the smallest unit of the hub's native token.
    #[serde(default = "default_observer_slash_amount")]
    pub observer_slash_amount: u64,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Tracing filter directive, e.g. `"info"` or `"debug,xchain_observer=trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_ballot_threshold() -> Decimal {
    // 0.66
    Decimal::from_raw(660_000_000_000_000_000)
}

fn default_ballot_maturity_blocks() -> i64 {
    100
}

fn default_pending_ballots_deletion_buffer_blocks() -> i64 {
    144_000
}

fn default_observer_slash_amount() -> u64 {
    // 0.1 of an 18-decimal token
    100_000_000_000_000_000
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ObserverConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ObserverError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ObserverError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ObserverError> {
        let config: Self = toml::from_str(s).map_err(|e| ObserverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ObserverError> {
        toml::to_string_pretty(self).map_err(|e| ObserverError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ObserverError> {
        if !self.default_ballot_threshold.is_fraction() {
            return Err(ObserverError::Config(format!(
                "default_ballot_threshold {} must be within [0, 1]",
                self.default_ballot_threshold
            )));
        }
        if self.ballot_maturity_blocks <= 0 {
            return Err(ObserverError::Config(format!(
                "ballot_maturity_blocks must be positive, got {}",
                self.ballot_maturity_blocks
            )));
        }
        if self.pending_ballots_deletion_buffer_blocks < 0 {
            return Err(ObserverError::Config(format!(
                "pending_ballots_deletion_buffer_blocks cannot be negative, got {}",
                self.pending_ballots_deletion_buffer_blocks
            )));
        }
        Ok(())
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            default_ballot_threshold: default_ballot_threshold(),
            ballot_maturity_blocks: default_ballot_maturity_blocks(),
            pending_ballots_deletion_buffer_blocks:
                default_pending_ballots_deletion_buffer_blocks(),
            observer_slash_amount: default_observer_slash_amount(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
