//! Control flag storage trait.

use crate::StoreError;

/// Singleton switches consulted by the surrounding node.
pub trait FlagsStore {
    fn get_crosschain_flags(&self) -> Result<Option<Vec<u8>>, StoreError>;

    fn get_operational_flags(&self) -> Result<Option<Vec<u8>>, StoreError>;
}
