//! TSS key status: the pending key generation, the active key, prior keys and
//! fund migrations between keys.
//!
//! The only transition is `Pending → Success`, taken when a keygen ballot for
//! the pending keygen height finalizes with success.

use serde::{Deserialize, Serialize};
use xchain_types::{Address, ChainId, Decimal};

use crate::ballot::{Ballot, BallotStatus};

/// Keygen ballots need every observer to agree.
pub const TSS_BALLOT_THRESHOLD: Decimal = Decimal::ONE;

/// Ballot id for a keygen outcome vote.
pub fn keygen_ballot_identifier(keygen_height: i64, tss_pubkey: &str) -> String {
    format!("{keygen_height}-{tss_pubkey}-tss-keygen")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeygenStatus {
    Pending,
    Success,
}

/// The key generation the observers are asked to run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keygen {
    pub status: KeygenStatus,
    /// Public keys of the signers taking part.
    pub granted_pubkeys: Vec<String>,
    /// Height the keygen is scheduled at while pending; height it completed
    /// at once successful.
    pub block_number: i64,
}

impl Keygen {
    pub fn pending(granted_pubkeys: Vec<String>, block_number: i64) -> Self {
        Self {
            status: KeygenStatus::Pending,
            granted_pubkeys,
            block_number,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == KeygenStatus::Pending
    }

    /// Apply a finalized keygen ballot.
    ///
    /// Returns the new key when the ballot finalized with success for the
    /// pending keygen height; the keygen is then marked successful at
    /// `height`. Failed or stale ballots leave the keygen untouched.
    pub fn complete(
        &mut self,
        ballot: &Ballot,
        keygen_height: i64,
        tss_pubkey: &str,
        height: i64,
    ) -> Option<Tss> {
        if !self.is_pending()
            || ballot.status() != BallotStatus::FinalizedSuccessObservation
            || keygen_height != self.block_number
        {
            return None;
        }

        self.status = KeygenStatus::Success;
        self.block_number = height;
        Some(Tss {
            tss_pubkey: tss_pubkey.to_string(),
            participant_list: self.granted_pubkeys.clone(),
            operator_address_list: ballot.voter_list().to_vec(),
            keygen_height,
            finalized_height: height,
        })
    }
}

/// A threshold signing key produced by a successful keygen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tss {
    pub tss_pubkey: String,
    pub participant_list: Vec<String>,
    /// Observers that voted the key in.
    pub operator_address_list: Vec<Address>,
    pub keygen_height: i64,
    pub finalized_height: i64,
}

/// Funds on `chain_id` moved from one historical key to another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundMigrationRecord {
    pub chain_id: ChainId,
    pub old_tss_pubkey: String,
    pub new_tss_pubkey: String,
    pub migration_height: i64,
}
