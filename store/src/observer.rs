//! Observer roster storage trait.

use crate::StoreError;

/// Singleton records describing the observer roster.
pub trait ObserverStore {
    fn get_observer_set(&self) -> Result<Option<Vec<u8>>, StoreError>;

    /// The roster size recorded at the last membership change.
    fn get_last_observer_count(&self) -> Result<Option<Vec<u8>>, StoreError>;
}
