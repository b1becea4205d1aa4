//! Abstract storage traits for the xchain observer.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. Values are opaque bytes; the observer keeper owns the encoding.
//! Reads go through the per-concern traits, writes are staged in a
//! [`WriteBatch`] and committed whole. The rest of the codebase depends only
//! on the traits.

pub mod ballot;
pub mod batch;
pub mod chain_params;
pub mod error;
pub mod flags;
pub mod observer;
pub mod tss;

pub use ballot::BallotStore;
pub use batch::{BatchStore, WriteBatch, WriteOp};
pub use chain_params::ChainParamsStore;
pub use error::StoreError;
pub use flags::FlagsStore;
pub use observer::ObserverStore;
pub use tss::TssStore;

/// Everything the observer module persists, behind one bound.
pub trait ObserverStateStore:
    BallotStore + ObserverStore + ChainParamsStore + TssStore + FlagsStore + BatchStore
{
}

impl<T> ObserverStateStore for T where
    T: BallotStore + ObserverStore + ChainParamsStore + TssStore + FlagsStore + BatchStore
{
}
