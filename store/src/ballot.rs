//! Ballot storage trait.

use crate::StoreError;

/// Ballots keyed by their identifier, plus the per-height index of ballot ids
/// created at each block height. Writes go through [`crate::WriteBatch`].
pub trait BallotStore {
    /// Retrieve a ballot by id.
    fn get_ballot(&self, index: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// All ballots, ordered by id.
    fn list_ballots(&self) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// Retrieve the list of ballot ids created at `height`.
    fn get_ballot_list(&self, height: i64) -> Result<Option<Vec<u8>>, StoreError>;
}
