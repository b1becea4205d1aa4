//! Write batching: every record a handler touches is staged here and handed
//! to the backend in one [`BatchStore::commit_batch`] call.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = WriteBatch::new();
//! batch.put_ballot(&id, ballot_bytes);
//! batch.put_ballot_list(height, index_bytes);
//! store.commit_batch(batch)?;
//! ```
//!
//! A backend applies the operations in order and either persists all of them
//! or none. Dropping a batch without committing it writes nothing.

use xchain_types::ChainId;

use crate::StoreError;

/// One staged write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOp {
    PutBallot { index: String, data: Vec<u8> },
    DeleteBallot { index: String },
    PutBallotList { height: i64, data: Vec<u8> },
    DeleteBallotList { height: i64 },
    PutObserverSet(Vec<u8>),
    PutLastObserverCount(Vec<u8>),
    PutChainParamsList(Vec<u8>),
    PutCrosschainFlags(Vec<u8>),
    PutOperationalFlags(Vec<u8>),
    PutKeygen(Vec<u8>),
    PutTss(Vec<u8>),
    PutTssHistory {
        finalized_height: i64,
        pubkey: String,
        data: Vec<u8>,
    },
    PutFundMigrator { chain_id: ChainId, data: Vec<u8> },
}

/// Ordered writes committed as a unit. Later writes to the same key win.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    // ── Ballots ─────────────────────────────────────────────────────────

    pub fn put_ballot(&mut self, index: &str, data: Vec<u8>) {
        self.ops.push(WriteOp::PutBallot {
            index: index.to_string(),
            data,
        });
    }

    /// Deleting a missing ballot is not an error.
    pub fn delete_ballot(&mut self, index: &str) {
        self.ops.push(WriteOp::DeleteBallot {
            index: index.to_string(),
        });
    }

    pub fn put_ballot_list(&mut self, height: i64, data: Vec<u8>) {
        self.ops.push(WriteOp::PutBallotList { height, data });
    }

    pub fn delete_ballot_list(&mut self, height: i64) {
        self.ops.push(WriteOp::DeleteBallotList { height });
    }

    // ── Singletons ──────────────────────────────────────────────────────

    pub fn put_observer_set(&mut self, data: Vec<u8>) {
        self.ops.push(WriteOp::PutObserverSet(data));
    }

    pub fn put_last_observer_count(&mut self, data: Vec<u8>) {
        self.ops.push(WriteOp::PutLastObserverCount(data));
    }

    pub fn put_chain_params_list(&mut self, data: Vec<u8>) {
        self.ops.push(WriteOp::PutChainParamsList(data));
    }

    pub fn put_crosschain_flags(&mut self, data: Vec<u8>) {
        self.ops.push(WriteOp::PutCrosschainFlags(data));
    }

    pub fn put_operational_flags(&mut self, data: Vec<u8>) {
        self.ops.push(WriteOp::PutOperationalFlags(data));
    }

    // ── TSS ─────────────────────────────────────────────────────────────

    pub fn put_keygen(&mut self, data: Vec<u8>) {
        self.ops.push(WriteOp::PutKeygen(data));
    }

    pub fn put_tss(&mut self, data: Vec<u8>) {
        self.ops.push(WriteOp::PutTss(data));
    }

    pub fn put_tss_history(&mut self, finalized_height: i64, pubkey: &str, data: Vec<u8>) {
        self.ops.push(WriteOp::PutTssHistory {
            finalized_height,
            pubkey: pubkey.to_string(),
            data,
        });
    }

    pub fn put_fund_migrator(&mut self, chain_id: ChainId, data: Vec<u8>) {
        self.ops.push(WriteOp::PutFundMigrator { chain_id, data });
    }
}

/// A backend that can persist a [`WriteBatch`] atomically.
pub trait BatchStore {
    /// Apply every operation in `batch`, or none of them.
    fn commit_batch(&self, batch: WriteBatch) -> Result<(), StoreError>;
}
