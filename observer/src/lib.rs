//! Observer module for the xchain hub.
//!
//! Independent observers watch external chains and vote on what they see.
//! This crate aggregates those votes into ballots, finalizes a ballot once a
//! super-majority of the observer roster agrees, and keeps the state the
//! votes depend on:
//!
//! - **Ballots**: one per observed event, with a voter list snapshotted from
//!   the roster at creation ([`ballot`], [`rewards`])
//! - **Observer set**: the roster of addresses allowed to vote ([`observer_set`])
//! - **Chain params**: per-chain confirmation policy ([`chain_params`])
//! - **TSS**: key generation status and key history ([`tss`])
//! - **Control flags**: inbound/outbound switches and operational knobs
//!   ([`crosschain_flags`])
//!
//! [`keeper::Keeper`] persists all of it through the `xchain-store` traits;
//! [`msg_server::MsgServer`] is the transaction surface on top.

pub mod authority;
pub mod ballot;
pub mod chain_params;
pub mod config;
pub mod crosschain_flags;
pub mod error;
pub mod genesis;
pub mod keeper;
pub mod logging;
pub mod messages;
pub mod msg_server;
pub mod observer_set;
pub mod rewards;
pub mod tss;

pub use authority::{Authority, PolicyTable, PolicyTier};
pub use ballot::{Ballot, BallotStatus, ObservationType, VoteType};
pub use chain_params::{ChainParams, ChainParamsError, ChainParamsList, ConfirmationParams};
pub use config::ObserverConfig;
pub use crosschain_flags::{
    BlockHeaderVerificationFlags, CrosschainFlags, FlagsChange, FlagsError,
    GasPriceIncreaseFlags, OperationalFlags,
};
pub use error::ObserverError;
pub use genesis::{export_genesis, init_genesis, GenesisState};
pub use keeper::{Keeper, VoteOutcome};
pub use messages::{Msg, MsgResponse, ReceiveStatus, VoteResponse};
pub use msg_server::MsgServer;
pub use observer_set::{LastObserverCount, ObserverSet};
pub use rewards::{Emission, RewardsDistribution, Settlement};
pub use tss::{FundMigrationRecord, Keygen, KeygenStatus, Tss};
