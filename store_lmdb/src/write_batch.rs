//! Write batching: applies a staged [`WriteBatch`] inside a single LMDB write
//! transaction, so a handler's records land together or not at all.
//!
//! If a [`BatchTxn`] is dropped without calling [`BatchTxn::commit`], every
//! operation applied to it is rolled back (the LMDB transaction is aborted).

use heed::RwTxn;

use xchain_store::{BatchStore, StoreError, WriteBatch, WriteOp};

use crate::environment::LmdbStore;
use crate::keys::{chain_key, height_key, tss_history_key};
use crate::singleton::{
    CHAIN_PARAMS_KEY, CROSSCHAIN_FLAGS_KEY, KEYGEN_KEY, LAST_OBSERVER_COUNT_KEY,
    OBSERVER_SET_KEY, OPERATIONAL_FLAGS_KEY, TSS_KEY,
};
use crate::LmdbError;

/// An open write transaction over every observer database.
pub struct BatchTxn<'a> {
    txn: RwTxn<'a>,
    store: &'a LmdbStore,
}

impl<'a> BatchTxn<'a> {
    pub(crate) fn new(store: &'a LmdbStore) -> Result<Self, LmdbError> {
        let txn = store.env.write_txn()?;
        Ok(Self { txn, store })
    }

    /// Apply one staged write to the open transaction.
    pub fn apply(&mut self, op: &WriteOp) -> Result<(), LmdbError> {
        let s = self.store;
        match op {
            WriteOp::PutBallot { index, data } => {
                s.ballots_db.put(&mut self.txn, index.as_bytes(), data)?;
            }
            WriteOp::DeleteBallot { index } => {
                s.ballots_db.delete(&mut self.txn, index.as_bytes())?;
            }
            WriteOp::PutBallotList { height, data } => {
                s.ballot_lists_db
                    .put(&mut self.txn, &height_key(*height), data)?;
            }
            WriteOp::DeleteBallotList { height } => {
                s.ballot_lists_db.delete(&mut self.txn, &height_key(*height))?;
            }
            WriteOp::PutObserverSet(data) => self.put_singleton(OBSERVER_SET_KEY, data)?,
            WriteOp::PutLastObserverCount(data) => {
                self.put_singleton(LAST_OBSERVER_COUNT_KEY, data)?
            }
            WriteOp::PutChainParamsList(data) => self.put_singleton(CHAIN_PARAMS_KEY, data)?,
            WriteOp::PutCrosschainFlags(data) => self.put_singleton(CROSSCHAIN_FLAGS_KEY, data)?,
            WriteOp::PutOperationalFlags(data) => {
                self.put_singleton(OPERATIONAL_FLAGS_KEY, data)?
            }
            WriteOp::PutKeygen(data) => self.put_singleton(KEYGEN_KEY, data)?,
            WriteOp::PutTss(data) => self.put_singleton(TSS_KEY, data)?,
            WriteOp::PutTssHistory {
                finalized_height,
                pubkey,
                data,
            } => {
                let key = tss_history_key(*finalized_height, pubkey);
                s.tss_history_db.put(&mut self.txn, &key, data)?;
            }
            WriteOp::PutFundMigrator { chain_id, data } => {
                s.fund_migrators_db
                    .put(&mut self.txn, &chain_key(*chain_id), data)?;
            }
        }
        Ok(())
    }

    fn put_singleton(&mut self, key: &[u8], data: &[u8]) -> Result<(), LmdbError> {
        self.store.singletons_db.put(&mut self.txn, key, data)?;
        Ok(())
    }

    /// Commit everything applied so far.
    pub fn commit(self) -> Result<(), LmdbError> {
        self.txn.commit()?;
        Ok(())
    }
}

impl BatchStore for LmdbStore {
    fn commit_batch(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let ops = batch.len();
        let aborted = |e: LmdbError| StoreError::BatchAborted {
            ops,
            reason: e.to_string(),
        };
        let mut txn = self.write_batch().map_err(aborted)?;
        for op in batch.ops() {
            txn.apply(op).map_err(aborted)?;
        }
        txn.commit().map_err(aborted)?;
        tracing::trace!(ops, "write batch committed");
        Ok(())
    }
}
