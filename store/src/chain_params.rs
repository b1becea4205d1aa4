//! Chain params storage trait.

use crate::StoreError;

/// The per-chain confirmation policy, stored as a single list.
pub trait ChainParamsStore {
    fn get_chain_params_list(&self) -> Result<Option<Vec<u8>>, StoreError>;
}
