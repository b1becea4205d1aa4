use thiserror::Error;
use xchain_types::{Address, ChainId, XchainError};

use crate::authority::PolicyTier;
use crate::chain_params::ChainParamsError;
use crate::crosschain_flags::FlagsError;

#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("storage error: {0}")]
    Store(#[from] xchain_store::StoreError),

    #[error(transparent)]
    Types(#[from] XchainError),

    #[error("invalid chain params: {0}")]
    ChainParams(#[from] ChainParamsError),

    #[error("invalid flags: {0}")]
    Flags(#[from] FlagsError),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid genesis: {0}")]
    Genesis(String),

    // ── Ballots ────────────────────────────────────────────────────────

    #[error("{voter} has already voted on ballot {ballot}")]
    AlreadyVoted { voter: Address, ballot: String },

    #[error("{voter} is not in the voter list of ballot {ballot}")]
    VoterNotInList { voter: Address, ballot: String },

    #[error("ballot {0} is already finalized")]
    BallotFinalized(String),

    #[error("a vote must be a success or failure observation")]
    InvalidVote,

    #[error("invalid ballot {ballot}: {reason}")]
    InvalidBallot { ballot: String, reason: String },

    // ── Observers and authorization ────────────────────────────────────

    #[error("observer set not found")]
    ObserverSetNotFound,

    #[error("observer set is empty, cannot create a ballot")]
    EmptyObserverSet,

    #[error("{0} is not an authorized observer")]
    NotAuthorizedObserver(Address),

    #[error("observer {0} is already in the observer set")]
    ObserverAlreadyExists(Address),

    #[error("observer {0} is not in the observer set")]
    ObserverNotFound(Address),

    #[error("{signer} is not authorized for the {tier} policy")]
    Unauthorized { signer: Address, tier: PolicyTier },

    // ── Chains and flags ───────────────────────────────────────────────

    #[error("inbound processing is disabled")]
    InboundDisabled,

    #[error("chain {0} is not supported")]
    UnsupportedChain(ChainId),

    #[error("chain params for chain {0} not found")]
    ChainParamsNotFound(ChainId),

    // ── TSS ────────────────────────────────────────────────────────────

    #[error("keygen not found")]
    KeygenNotFound,

    #[error("keygen is not pending")]
    KeygenCompleted,

    #[error("no active TSS key")]
    TssNotFound,

    #[error("TSS key {0} not found in history")]
    TssHistoryNotFound(String),

    #[error("fund migration for chain {0} already recorded")]
    FundMigrationExists(ChainId),

    #[error("fund migration must move funds between two different keys")]
    FundMigrationSameKey,
}

impl From<bincode::Error> for ObserverError {
    fn from(e: bincode::Error) -> Self {
        ObserverError::Encoding(e.to_string())
    }
}

impl From<serde_json::Error> for ObserverError {
    fn from(e: serde_json::Error) -> Self {
        ObserverError::Genesis(e.to_string())
    }
}
