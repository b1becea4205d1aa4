//! LMDB implementation of TssStore.

use xchain_store::{StoreError, TssStore};
use xchain_types::ChainId;

use crate::environment::LmdbStore;
use crate::keys::chain_key;
use crate::singleton::{KEYGEN_KEY, TSS_KEY};

impl TssStore for LmdbStore {
    fn get_keygen(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(self.singletons_db, KEYGEN_KEY)?)
    }

    fn get_tss(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(self.singletons_db, TSS_KEY)?)
    }

    fn list_tss_history(&self) -> Result<Vec<Vec<u8>>, StoreError> {
        Ok(self
            .entries(self.tss_history_db)?
            .into_iter()
            .map(|(_, v)| v)
            .collect())
    }

    fn get_fund_migrator(&self, chain_id: ChainId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(self.fund_migrators_db, &chain_key(chain_id))?)
    }

    fn list_fund_migrators(&self) -> Result<Vec<Vec<u8>>, StoreError> {
        Ok(self
            .entries(self.fund_migrators_db)?
            .into_iter()
            .map(|(_, v)| v)
            .collect())
    }
}
