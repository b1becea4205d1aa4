//! Transaction messages accepted by the observer module.
//!
//! Vote messages derive their ballot identifier from the observed content, so
//! every observer reporting the same event lands on the same ballot. The
//! submitting observer is never part of the digest.

use serde::{Deserialize, Serialize};
use xchain_types::{Address, Chain, ChainId, ObservationHash, XchainError};

use crate::ballot::{BallotStatus, VoteType};
use crate::chain_params::ChainParams;
use crate::crosschain_flags::{
    BlockHeaderVerificationFlags, GasPriceIncreaseFlags, OperationalFlags,
};
use crate::error::ObserverError;
use crate::tss::keygen_ballot_identifier;

/// Outcome an observer saw on the external chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiveStatus {
    Success,
    Failed,
}

impl ReceiveStatus {
    pub fn vote(&self) -> VoteType {
        match self {
            ReceiveStatus::Success => VoteType::SuccessObservation,
            ReceiveStatus::Failed => VoteType::FailureObservation,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoinType {
    /// The chain's native gas token.
    Gas,
    Erc20,
    /// No asset, only a call.
    NoAssetCall,
}

impl CoinType {
    fn tag(&self) -> u8 {
        match self {
            CoinType::Gas => 0,
            CoinType::Erc20 => 1,
            CoinType::NoAssetCall => 2,
        }
    }
}

/// An observer reports a transfer into the hub from an external chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVoteInbound {
    pub creator: Address,
    pub sender: String,
    pub sender_chain_id: ChainId,
    pub tx_origin: String,
    pub receiver: String,
    pub receiver_chain_id: ChainId,
    pub amount: u128,
    pub message: String,
    pub inbound_hash: String,
    pub inbound_block_height: u64,
    pub coin_type: CoinType,
    pub asset: String,
    pub event_index: u64,
}

impl MsgVoteInbound {
    /// Ballot identifier: hex digest of everything but the creator.
    pub fn digest(&self) -> String {
        ObservationHash::of_fields(&[
            self.sender.as_bytes(),
            &self.sender_chain_id.to_be_bytes(),
            self.tx_origin.as_bytes(),
            self.receiver.as_bytes(),
            &self.receiver_chain_id.to_be_bytes(),
            &self.amount.to_be_bytes(),
            self.message.as_bytes(),
            self.inbound_hash.as_bytes(),
            &self.inbound_block_height.to_be_bytes(),
            &[self.coin_type.tag()],
            self.asset.as_bytes(),
            &self.event_index.to_be_bytes(),
        ])
        .to_hex()
    }
}

/// An observer reports the result of an outbound transaction it watched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVoteOutbound {
    pub creator: Address,
    /// Identifier of the cross-chain transfer this outbound belongs to.
    pub cctx_hash: String,
    pub observed_outbound_hash: String,
    pub observed_outbound_block_height: u64,
    pub value_received: u128,
    pub status: ReceiveStatus,
    pub outbound_chain_id: ChainId,
    pub outbound_tss_nonce: u64,
}

impl MsgVoteOutbound {
    /// Ballot identifier: hex digest of everything but the creator and the
    /// status, so success and failure votes on one outbound share a ballot.
    pub fn digest(&self) -> String {
        ObservationHash::of_fields(&[
            self.cctx_hash.as_bytes(),
            self.observed_outbound_hash.as_bytes(),
            &self.observed_outbound_block_height.to_be_bytes(),
            &self.value_received.to_be_bytes(),
            &self.outbound_chain_id.to_be_bytes(),
            &self.outbound_tss_nonce.to_be_bytes(),
        ])
        .to_hex()
    }
}

/// An observer reports the outcome of a key generation ceremony.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVoteTss {
    pub creator: Address,
    pub tss_pubkey: String,
    pub keygen_height: i64,
    pub status: ReceiveStatus,
}

impl MsgVoteTss {
    pub fn digest(&self) -> String {
        keygen_ballot_identifier(self.keygen_height, &self.tss_pubkey)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAddObserver {
    pub creator: Address,
    pub observer_address: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRemoveObserver {
    pub creator: Address,
    pub observer_address: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateObserver {
    pub creator: Address,
    pub old_observer_address: Address,
    pub new_observer_address: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateChainParams {
    pub creator: Address,
    pub chain_params: ChainParams,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRemoveChainParams {
    pub creator: Address,
    pub chain_id: ChainId,
}

/// New crosschain flags. `None` sub-flags keep their current value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateCrosschainFlags {
    pub creator: Address,
    pub is_inbound_enabled: bool,
    pub is_outbound_enabled: bool,
    pub gas_price_increase_flags: Option<GasPriceIncreaseFlags>,
    pub block_header_verification_flags: Option<BlockHeaderVerificationFlags>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateOperationalFlags {
    pub creator: Address,
    pub operational_flags: OperationalFlags,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAddFundMigration {
    pub creator: Address,
    pub chain_id: ChainId,
    pub old_tss_pubkey: String,
    pub new_tss_pubkey: String,
}

/// Every message the module routes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Msg {
    VoteInbound(MsgVoteInbound),
    VoteOutbound(MsgVoteOutbound),
    VoteTss(MsgVoteTss),
    AddObserver(MsgAddObserver),
    RemoveObserver(MsgRemoveObserver),
    UpdateObserver(MsgUpdateObserver),
    UpdateChainParams(MsgUpdateChainParams),
    RemoveChainParams(MsgRemoveChainParams),
    UpdateCrosschainFlags(MsgUpdateCrosschainFlags),
    UpdateOperationalFlags(MsgUpdateOperationalFlags),
    AddFundMigration(MsgAddFundMigration),
}

impl Msg {
    pub fn creator(&self) -> &Address {
        match self {
            Msg::VoteInbound(m) => &m.creator,
            Msg::VoteOutbound(m) => &m.creator,
            Msg::VoteTss(m) => &m.creator,
            Msg::AddObserver(m) => &m.creator,
            Msg::RemoveObserver(m) => &m.creator,
            Msg::UpdateObserver(m) => &m.creator,
            Msg::UpdateChainParams(m) => &m.creator,
            Msg::RemoveChainParams(m) => &m.creator,
            Msg::UpdateCrosschainFlags(m) => &m.creator,
            Msg::UpdateOperationalFlags(m) => &m.creator,
            Msg::AddFundMigration(m) => &m.creator,
        }
    }

    /// Stateless checks, run before any state is read.
    pub fn validate_basic(&self) -> Result<(), ObserverError> {
        require_address(self.creator())?;
        match self {
            Msg::VoteInbound(m) => {
                Chain::require(m.sender_chain_id)?;
                Chain::require(m.receiver_chain_id)?;
                require_non_empty("inbound_hash", &m.inbound_hash)
            }
            Msg::VoteOutbound(m) => {
                Chain::require(m.outbound_chain_id)?;
                require_non_empty("cctx_hash", &m.cctx_hash)?;
                require_non_empty("observed_outbound_hash", &m.observed_outbound_hash)
            }
            Msg::VoteTss(m) => require_non_empty("tss_pubkey", &m.tss_pubkey),
            Msg::AddObserver(m) => require_address(&m.observer_address),
            Msg::RemoveObserver(m) => require_address(&m.observer_address),
            Msg::UpdateObserver(m) => {
                require_address(&m.old_observer_address)?;
                require_address(&m.new_observer_address)
            }
            Msg::UpdateChainParams(m) => Ok(m.chain_params.validate()?),
            Msg::RemoveChainParams(m) => {
                Chain::require(m.chain_id)?;
                Ok(())
            }
            Msg::UpdateCrosschainFlags(m) => match &m.gas_price_increase_flags {
                Some(gas) => Ok(gas.validate()?),
                None => Ok(()),
            },
            Msg::UpdateOperationalFlags(m) => Ok(m.operational_flags.validate()?),
            Msg::AddFundMigration(m) => {
                Chain::require(m.chain_id)?;
                require_non_empty("old_tss_pubkey", &m.old_tss_pubkey)?;
                require_non_empty("new_tss_pubkey", &m.new_tss_pubkey)
            }
        }
    }
}

fn require_address(address: &Address) -> Result<(), ObserverError> {
    if address.is_valid() {
        Ok(())
    } else {
        Err(XchainError::InvalidAddress(address.to_string()).into())
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ObserverError> {
    if value.is_empty() {
        return Err(ObserverError::InvalidMessage(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Result of a vote message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResponse {
    pub ballot_identifier: String,
    pub ballot_created: bool,
    /// Set only on the vote that finalized the ballot.
    pub finalized: Option<BallotStatus>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsgResponse {
    Vote(VoteResponse),
    Ok,
}
