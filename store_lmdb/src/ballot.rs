//! LMDB implementation of BallotStore.
//!
//! Ballots are keyed by their id bytes; the per-height index is keyed by the
//! order-preserving height encoding from [`crate::keys`].

use xchain_store::{BallotStore, StoreError};

use crate::environment::LmdbStore;
use crate::keys::height_key;

impl BallotStore for LmdbStore {
    fn get_ballot(&self, index: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(self.ballots_db, index.as_bytes())?)
    }

    fn list_ballots(&self) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let mut out = Vec::new();
        for (key, value) in self.entries(self.ballots_db)? {
            let id = String::from_utf8(key).map_err(|e| StoreError::MalformedKey {
                table: "ballots",
                reason: e.to_string(),
            })?;
            out.push((id, value));
        }
        Ok(out)
    }

    fn get_ballot_list(&self, height: i64) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(self.ballot_lists_db, &height_key(height))?)
    }
}
