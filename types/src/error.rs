//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for the primitive xchain types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XchainError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),

    #[error("chain id {0} not found in chain list")]
    UnknownChain(i64),
}
