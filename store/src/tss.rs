//! TSS key storage trait.

use crate::StoreError;
use xchain_types::ChainId;

/// Storage for the key-generation record, the active TSS key, the history of
/// prior keys and fund migration bookkeeping.
///
/// History entries are keyed by `(finalized_height, pubkey)` and listed in
/// that order. Fund migration records are keyed by chain id.
pub trait TssStore {
    fn get_keygen(&self) -> Result<Option<Vec<u8>>, StoreError>;

    fn get_tss(&self) -> Result<Option<Vec<u8>>, StoreError>;

    /// All historical keys, oldest first.
    fn list_tss_history(&self) -> Result<Vec<Vec<u8>>, StoreError>;

    fn get_fund_migrator(&self, chain_id: ChainId) -> Result<Option<Vec<u8>>, StoreError>;

    /// All fund migration records, ordered by chain id.
    fn list_fund_migrators(&self) -> Result<Vec<Vec<u8>>, StoreError>;
}
