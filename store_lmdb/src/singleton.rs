//! LMDB implementation of the singleton stores: observer roster, chain
//! params and control flags. All live in one database under fixed keys.

use xchain_store::{ChainParamsStore, FlagsStore, ObserverStore, StoreError};

use crate::environment::LmdbStore;

pub(crate) const OBSERVER_SET_KEY: &[u8] = b"observer_set";
pub(crate) const LAST_OBSERVER_COUNT_KEY: &[u8] = b"last_observer_count";
pub(crate) const CHAIN_PARAMS_KEY: &[u8] = b"chain_params_list";
pub(crate) const CROSSCHAIN_FLAGS_KEY: &[u8] = b"crosschain_flags";
pub(crate) const OPERATIONAL_FLAGS_KEY: &[u8] = b"operational_flags";
pub(crate) const KEYGEN_KEY: &[u8] = b"keygen";
pub(crate) const TSS_KEY: &[u8] = b"tss";

impl ObserverStore for LmdbStore {
    fn get_observer_set(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(self.singletons_db, OBSERVER_SET_KEY)?)
    }

    fn get_last_observer_count(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(self.singletons_db, LAST_OBSERVER_COUNT_KEY)?)
    }
}

impl ChainParamsStore for LmdbStore {
    fn get_chain_params_list(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(self.singletons_db, CHAIN_PARAMS_KEY)?)
    }
}

impl FlagsStore for LmdbStore {
    fn get_crosschain_flags(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(self.singletons_db, CROSSCHAIN_FLAGS_KEY)?)
    }

    fn get_operational_flags(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(self.singletons_db, OPERATIONAL_FLAGS_KEY)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xchain_store::{BatchStore, WriteBatch};

    #[test]
    fn singletons_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbStore::open(dir.path()).unwrap();
        let mut batch = WriteBatch::new();
        batch.put_observer_set(b"set".to_vec());
        batch.put_last_observer_count(b"count".to_vec());
        batch.put_chain_params_list(b"params".to_vec());
        batch.put_crosschain_flags(b"xflags".to_vec());
        store.commit_batch(batch).unwrap();

        assert_eq!(store.get_observer_set().unwrap(), Some(b"set".to_vec()));
        assert_eq!(store.get_last_observer_count().unwrap(), Some(b"count".to_vec()));
        assert_eq!(store.get_chain_params_list().unwrap(), Some(b"params".to_vec()));
        assert_eq!(store.get_crosschain_flags().unwrap(), Some(b"xflags".to_vec()));
        assert_eq!(store.get_operational_flags().unwrap(), None);
    }
}
