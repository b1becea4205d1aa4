//! LMDB storage backend for the xchain observer.
//!
//! Implements all storage traits from `xchain-store` using the `heed` LMDB bindings.
//! Each logical store maps to one LMDB database within a single environment;
//! a write batch spans all of them in one transaction.

pub mod ballot;
pub mod environment;
pub mod error;
pub mod keys;
pub mod singleton;
pub mod tss;
pub mod write_batch;

pub use environment::LmdbStore;
pub use error::LmdbError;
pub use write_batch::BatchTxn;
