//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::write_batch::BatchTxn;
use crate::LmdbError;

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";
const MAX_DBS: u32 = 8;
const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and all database handles.
///
/// One value implements every observer storage trait. Reads open a short
/// read transaction; writes arrive as a batch and share one write transaction
/// (see [`crate::write_batch`]).
pub struct LmdbStore {
    pub(crate) env: Arc<Env>,
    pub(crate) ballots_db: Database<Bytes, Bytes>,
    pub(crate) ballot_lists_db: Database<Bytes, Bytes>,
    pub(crate) singletons_db: Database<Bytes, Bytes>,
    pub(crate) tss_history_db: Database<Bytes, Bytes>,
    pub(crate) fund_migrators_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbStore {
    /// Open or create an LMDB environment at `path` with a 1 GiB map.
    pub fn open(path: &Path) -> Result<Self, LmdbError> {
        Self::open_with_map_size(path, DEFAULT_MAP_SIZE)
    }

    /// Open or create an LMDB environment at the given path.
    pub fn open_with_map_size(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per path by this process and
        // never through another handle with different flags.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let ballots_db = env.create_database(&mut wtxn, Some("ballots"))?;
        let ballot_lists_db = env.create_database(&mut wtxn, Some("ballot_lists"))?;
        let singletons_db = env.create_database(&mut wtxn, Some("singletons"))?;
        let tss_history_db = env.create_database(&mut wtxn, Some("tss_history"))?;
        let fund_migrators_db = env.create_database(&mut wtxn, Some("fund_migrators"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let store = Self {
            env: Arc::new(env),
            ballots_db,
            ballot_lists_db,
            singletons_db,
            tss_history_db,
            fund_migrators_db,
            meta_db,
        };
        store.check_schema_version()?;
        tracing::info!(path = %path.display(), map_size, "opened observer LMDB store");
        Ok(store)
    }

    /// The schema version stored in the database, 0 for a fresh database.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        match self.meta_db.get(&rtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => Ok(bincode::deserialize(bytes)?),
            None => Ok(0),
        }
    }

    fn check_schema_version(&self) -> Result<(), LmdbError> {
        let found = self.schema_version()?;
        if found > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaTooNew {
                found,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }
        if found < CURRENT_SCHEMA_VERSION {
            let bytes = bincode::serialize(&CURRENT_SCHEMA_VERSION)?;
            let mut wtxn = self.env.write_txn()?;
            self.meta_db.put(&mut wtxn, SCHEMA_VERSION_KEY, &bytes)?;
            wtxn.commit()?;
            tracing::info!(from = found, to = CURRENT_SCHEMA_VERSION, "stamped schema version");
        }
        Ok(())
    }

    /// Begin a write transaction over every database.
    pub fn write_batch(&self) -> Result<BatchTxn<'_>, LmdbError> {
        BatchTxn::new(self)
    }

    pub(crate) fn get(
        &self,
        db: Database<Bytes, Bytes>,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        Ok(db.get(&rtxn, key)?.map(<[u8]>::to_vec))
    }

    /// Every `(key, value)` pair in key order.
    pub(crate) fn entries(
        &self,
        db: Database<Bytes, Bytes>,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let mut out = Vec::new();
        for item in db.iter(&rtxn)? {
            let (key, value) = item?;
            out.push((key.to_vec(), value.to_vec()));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_meta(store: &LmdbStore, key: &[u8], value: &[u8]) {
        let mut wtxn = store.env.write_txn().unwrap();
        store.meta_db.put(&mut wtxn, key, value).unwrap();
        wtxn.commit().unwrap();
    }

    #[test]
    fn fresh_database_is_stamped() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbStore::open(dir.path()).unwrap();
        assert_eq!(store.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LmdbStore::open(dir.path()).unwrap();
            put_meta(&store, b"k", b"v");
        }
        let store = LmdbStore::open(dir.path()).unwrap();
        assert_eq!(store.get(store.meta_db, b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn newer_schema_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LmdbStore::open(dir.path()).unwrap();
            let bytes = bincode::serialize(&(CURRENT_SCHEMA_VERSION + 1)).unwrap();
            put_meta(&store, SCHEMA_VERSION_KEY, &bytes);
        }
        match LmdbStore::open(dir.path()) {
            Err(LmdbError::SchemaTooNew { found, supported }) => {
                assert_eq!(found, CURRENT_SCHEMA_VERSION + 1);
                assert_eq!(supported, CURRENT_SCHEMA_VERSION);
            }
            other => panic!("expected SchemaTooNew, got {:?}", other.err()),
        }
    }
}
