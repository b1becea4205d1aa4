//! Nullable store: thread-safe in-memory storage for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use xchain_store::{
    BallotStore, BatchStore, ChainParamsStore, FlagsStore, ObserverStore, StoreError, TssStore,
    WriteBatch, WriteOp,
};
use xchain_types::ChainId;

/// Singleton record slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Slot {
    ObserverSet,
    LastObserverCount,
    ChainParams,
    Keygen,
    Tss,
    CrosschainFlags,
    OperationalFlags,
}

/// An in-memory store implementing every observer storage trait.
///
/// All maps are ordered so listings come back in key order, the same order
/// the LMDB backend produces. A batch is applied with every map locked, so
/// readers never see half of it.
#[derive(Default)]
pub struct NullStore {
    ballots: Mutex<BTreeMap<String, Vec<u8>>>,
    ballot_lists: Mutex<BTreeMap<i64, Vec<u8>>>,
    singletons: Mutex<BTreeMap<Slot, Vec<u8>>>,
    tss_history: Mutex<BTreeMap<(i64, String), Vec<u8>>>,
    fund_migrators: Mutex<BTreeMap<ChainId, Vec<u8>>>,
    fail_next_commit: AtomicBool,
    commits: AtomicUsize,
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    m.lock()
        .map_err(|_| StoreError::Backend("null store mutex poisoned".to_string()))
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored ballots.
    pub fn ballot_count(&self) -> usize {
        self.ballots.lock().map(|b| b.len()).unwrap_or(0)
    }

    /// Heights that currently have a ballot index entry.
    pub fn indexed_heights(&self) -> Vec<i64> {
        self.ballot_lists
            .lock()
            .map(|l| l.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Refuse the next committed batch, as a backend would on a failed write.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Number of batches committed so far.
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    fn get_slot(&self, slot: Slot) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.singletons)?.get(&slot).cloned())
    }
}

impl BatchStore for NullStore {
    fn commit_batch(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::BatchAborted {
                ops: batch.len(),
                reason: "injected commit failure".to_string(),
            });
        }

        // Fixed lock order; every guard is held until the last op is applied.
        let mut ballots = lock(&self.ballots)?;
        let mut ballot_lists = lock(&self.ballot_lists)?;
        let mut singletons = lock(&self.singletons)?;
        let mut tss_history = lock(&self.tss_history)?;
        let mut fund_migrators = lock(&self.fund_migrators)?;

        for op in batch.into_ops() {
            match op {
                WriteOp::PutBallot { index, data } => {
                    ballots.insert(index, data);
                }
                WriteOp::DeleteBallot { index } => {
                    ballots.remove(&index);
                }
                WriteOp::PutBallotList { height, data } => {
                    ballot_lists.insert(height, data);
                }
                WriteOp::DeleteBallotList { height } => {
                    ballot_lists.remove(&height);
                }
                WriteOp::PutObserverSet(data) => {
                    singletons.insert(Slot::ObserverSet, data);
                }
                WriteOp::PutLastObserverCount(data) => {
                    singletons.insert(Slot::LastObserverCount, data);
                }
                WriteOp::PutChainParamsList(data) => {
                    singletons.insert(Slot::ChainParams, data);
                }
                WriteOp::PutCrosschainFlags(data) => {
                    singletons.insert(Slot::CrosschainFlags, data);
                }
                WriteOp::PutOperationalFlags(data) => {
                    singletons.insert(Slot::OperationalFlags, data);
                }
                WriteOp::PutKeygen(data) => {
                    singletons.insert(Slot::Keygen, data);
                }
                WriteOp::PutTss(data) => {
                    singletons.insert(Slot::Tss, data);
                }
                WriteOp::PutTssHistory {
                    finalized_height,
                    pubkey,
                    data,
                } => {
                    tss_history.insert((finalized_height, pubkey), data);
                }
                WriteOp::PutFundMigrator { chain_id, data } => {
                    fund_migrators.insert(chain_id, data);
                }
            }
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl BallotStore for NullStore {
    fn get_ballot(&self, index: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.ballots)?.get(index).cloned())
    }

    fn list_ballots(&self) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        Ok(lock(&self.ballots)?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn get_ballot_list(&self, height: i64) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.ballot_lists)?.get(&height).cloned())
    }
}

impl ObserverStore for NullStore {
    fn get_observer_set(&self) -> Result<Option<Vec<u8>>, StoreError> {
        self.get_slot(Slot::ObserverSet)
    }

    fn get_last_observer_count(&self) -> Result<Option<Vec<u8>>, StoreError> {
        self.get_slot(Slot::LastObserverCount)
    }
}

impl ChainParamsStore for NullStore {
    fn get_chain_params_list(&self) -> Result<Option<Vec<u8>>, StoreError> {
        self.get_slot(Slot::ChainParams)
    }
}

impl FlagsStore for NullStore {
    fn get_crosschain_flags(&self) -> Result<Option<Vec<u8>>, StoreError> {
        self.get_slot(Slot::CrosschainFlags)
    }

    fn get_operational_flags(&self) -> Result<Option<Vec<u8>>, StoreError> {
        self.get_slot(Slot::OperationalFlags)
    }
}

impl TssStore for NullStore {
    fn get_keygen(&self) -> Result<Option<Vec<u8>>, StoreError> {
        self.get_slot(Slot::Keygen)
    }

    fn get_tss(&self) -> Result<Option<Vec<u8>>, StoreError> {
        self.get_slot(Slot::Tss)
    }

    fn list_tss_history(&self) -> Result<Vec<Vec<u8>>, StoreError> {
        Ok(lock(&self.tss_history)?.values().cloned().collect())
    }

    fn get_fund_migrator(&self, chain_id: ChainId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(lock(&self.fund_migrators)?.get(&chain_id).cloned())
    }

    fn list_fund_migrators(&self) -> Result<Vec<Vec<u8>>, StoreError> {
        Ok(lock(&self.fund_migrators)?.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(store: &NullStore, stage: impl FnOnce(&mut WriteBatch)) {
        let mut batch = WriteBatch::new();
        stage(&mut batch);
        store.commit_batch(batch).unwrap();
    }

    #[test]
    fn ballot_roundtrip_and_delete() {
        let store = NullStore::new();
        commit(&store, |b| b.put_ballot("b1", b"one".to_vec()));
        assert_eq!(store.get_ballot("b1").unwrap(), Some(b"one".to_vec()));
        assert_eq!(store.ballot_count(), 1);
        commit(&store, |b| b.delete_ballot("b1"));
        assert_eq!(store.get_ballot("b1").unwrap(), None);
        // deleting twice is fine
        commit(&store, |b| b.delete_ballot("b1"));
        assert_eq!(store.commits(), 3);
    }

    #[test]
    fn list_ballots_is_ordered_by_id() {
        let store = NullStore::new();
        commit(&store, |b| {
            b.put_ballot("c", b"3".to_vec());
            b.put_ballot("a", b"1".to_vec());
            b.put_ballot("b", b"2".to_vec());
        });
        let ids: Vec<String> = store.list_ballots().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn ballot_lists_by_height() {
        let store = NullStore::new();
        commit(&store, |b| {
            b.put_ballot_list(10, b"x".to_vec());
            b.put_ballot_list(-1, b"y".to_vec());
        });
        assert_eq!(store.indexed_heights(), vec![-1, 10]);
        commit(&store, |b| b.delete_ballot_list(10));
        assert_eq!(store.get_ballot_list(10).unwrap(), None);
    }

    #[test]
    fn singletons_are_independent() {
        let store = NullStore::new();
        commit(&store, |b| b.put_crosschain_flags(b"flags".to_vec()));
        assert_eq!(store.get_operational_flags().unwrap(), None);
        assert_eq!(store.get_crosschain_flags().unwrap(), Some(b"flags".to_vec()));
        commit(&store, |b| b.put_keygen(b"k".to_vec()));
        assert_eq!(store.get_tss().unwrap(), None);
    }

    #[test]
    fn tss_history_ordered_by_height() {
        let store = NullStore::new();
        commit(&store, |b| {
            b.put_tss_history(20, "bb", b"second".to_vec());
            b.put_tss_history(10, "zz", b"first".to_vec());
        });
        assert_eq!(
            store.list_tss_history().unwrap(),
            vec![b"first".to_vec(), b"second".to_vec()]
        );
    }

    #[test]
    fn fund_migrators_by_chain() {
        let store = NullStore::new();
        commit(&store, |b| {
            b.put_fund_migrator(ChainId::new(56), b"bsc".to_vec());
            b.put_fund_migrator(ChainId::new(1), b"eth".to_vec());
        });
        assert_eq!(store.get_fund_migrator(ChainId::new(1)).unwrap(), Some(b"eth".to_vec()));
        assert_eq!(
            store.list_fund_migrators().unwrap(),
            vec![b"eth".to_vec(), b"bsc".to_vec()]
        );
    }

    #[test]
    fn failed_commit_writes_nothing() {
        let store = NullStore::new();
        store.fail_next_commit();
        let mut batch = WriteBatch::new();
        batch.put_ballot("b1", b"one".to_vec());
        batch.put_ballot_list(3, b"ids".to_vec());
        assert!(matches!(
            store.commit_batch(batch),
            Err(StoreError::BatchAborted { ops: 2, .. })
        ));
        assert_eq!(store.ballot_count(), 0);
        assert!(store.indexed_heights().is_empty());
        assert_eq!(store.commits(), 0);

        // Only the next commit is refused.
        commit(&store, |b| b.put_ballot("b1", b"one".to_vec()));
        assert_eq!(store.ballot_count(), 1);
    }
}
