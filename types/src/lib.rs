//! Fundamental types for the xchain observer.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! observer addresses, the canonical chain registry, fixed-point decimals used for
//! ballot thresholds, and the digest type that ballot identifiers are derived from.

pub mod address;
pub mod chain;
pub mod decimal;
pub mod error;
pub mod hash;

pub use address::Address;
pub use chain::{Chain, ChainId, Consensus, Network, NetworkType, Vm};
pub use decimal::Decimal;
pub use error::XchainError;
pub use hash::ObservationHash;
