//! Transaction handlers for the observer module.
//!
//! Each handler checks authorization and preconditions before the keeper
//! writes anything, so a rejected message leaves state untouched.

use xchain_store::{ObserverStateStore, WriteBatch};
use xchain_types::chain::is_hub_chain;
use xchain_types::Address;

use crate::authority::{Authority, PolicyTier};
use crate::ballot::{ObservationType, VoteType};
use crate::crosschain_flags::CrosschainFlags;
use crate::error::ObserverError;
use crate::keeper::{Keeper, VoteOutcome};
use crate::messages::{
    Msg, MsgAddFundMigration, MsgAddObserver, MsgRemoveChainParams, MsgRemoveObserver,
    MsgResponse, MsgUpdateChainParams, MsgUpdateCrosschainFlags, MsgUpdateObserver,
    MsgUpdateOperationalFlags, MsgVoteInbound, MsgVoteOutbound, MsgVoteTss, VoteResponse,
};
use crate::tss::TSS_BALLOT_THRESHOLD;

pub struct MsgServer<'a, S, A> {
    keeper: &'a Keeper<S>,
    authority: &'a A,
}

impl<'a, S: ObserverStateStore, A: Authority> MsgServer<'a, S, A> {
    pub fn new(keeper: &'a Keeper<S>, authority: &'a A) -> Self {
        Self { keeper, authority }
    }

    /// Validate and route `msg` at block `height`.
    pub fn handle(&self, msg: &Msg, height: i64) -> Result<MsgResponse, ObserverError> {
        msg.validate_basic()?;
        let response = match msg {
            Msg::VoteInbound(m) => MsgResponse::Vote(self.vote_inbound(m, height)?),
            Msg::VoteOutbound(m) => MsgResponse::Vote(self.vote_outbound(m, height)?),
            Msg::VoteTss(m) => MsgResponse::Vote(self.vote_tss(m, height)?),
            Msg::AddObserver(m) => {
                self.add_observer(m, height)?;
                MsgResponse::Ok
            }
            Msg::RemoveObserver(m) => {
                self.remove_observer(m, height)?;
                MsgResponse::Ok
            }
            Msg::UpdateObserver(m) => {
                self.update_observer(m, height)?;
                MsgResponse::Ok
            }
            Msg::UpdateChainParams(m) => {
                self.update_chain_params(m)?;
                MsgResponse::Ok
            }
            Msg::RemoveChainParams(m) => {
                self.remove_chain_params(m)?;
                MsgResponse::Ok
            }
            Msg::UpdateCrosschainFlags(m) => {
                self.update_crosschain_flags(m)?;
                MsgResponse::Ok
            }
            Msg::UpdateOperationalFlags(m) => {
                self.update_operational_flags(m)?;
                MsgResponse::Ok
            }
            Msg::AddFundMigration(m) => {
                self.add_fund_migration(m, height)?;
                MsgResponse::Ok
            }
        };
        Ok(response)
    }

    fn require_observer(&self, creator: &Address) -> Result<(), ObserverError> {
        if self.keeper.is_authorized(creator)? {
            Ok(())
        } else {
            Err(ObserverError::NotAuthorizedObserver(creator.clone()))
        }
    }

    fn require_tier(&self, signer: &Address, tier: PolicyTier) -> Result<(), ObserverError> {
        if self.authority.is_authorized(signer, tier) {
            Ok(())
        } else {
            tracing::debug!(signer = %signer, %tier, "privileged message rejected");
            Err(ObserverError::Unauthorized {
                signer: signer.clone(),
                tier,
            })
        }
    }

    // ── Votes ──────────────────────────────────────────────────────────

    /// Inbound observations are always success votes; the ballot threshold
    /// comes from the sending chain's params.
    pub fn vote_inbound(
        &self,
        msg: &MsgVoteInbound,
        height: i64,
    ) -> Result<VoteResponse, ObserverError> {
        self.require_observer(&msg.creator)?;
        if !self.keeper.is_inbound_enabled()? {
            return Err(ObserverError::InboundDisabled);
        }
        let params = self.keeper.get_supported_chain_params(msg.sender_chain_id)?;
        if !is_hub_chain(msg.receiver_chain_id) {
            self.keeper
                .get_supported_chain_params(msg.receiver_chain_id)?;
        }

        let outcome = self.keeper.vote_on_ballot(
            &msg.digest(),
            ObservationType::InboundTx,
            params.ballot_threshold,
            &msg.creator,
            VoteType::SuccessObservation,
            height,
        )?;
        Ok(response(&outcome))
    }

    pub fn vote_outbound(
        &self,
        msg: &MsgVoteOutbound,
        height: i64,
    ) -> Result<VoteResponse, ObserverError> {
        self.require_observer(&msg.creator)?;
        let params = self
            .keeper
            .get_supported_chain_params(msg.outbound_chain_id)?;
        if self.keeper.get_tss()?.is_none() {
            return Err(ObserverError::TssNotFound);
        }

        let outcome = self.keeper.vote_on_ballot(
            &msg.digest(),
            ObservationType::OutboundTx,
            params.ballot_threshold,
            &msg.creator,
            msg.status.vote(),
            height,
        )?;
        Ok(response(&outcome))
    }

    /// Keygen outcome votes need every observer; a successful finalization
    /// completes the pending keygen in the same commit as the vote.
    pub fn vote_tss(&self, msg: &MsgVoteTss, height: i64) -> Result<VoteResponse, ObserverError> {
        self.require_observer(&msg.creator)?;
        let keygen = self
            .keeper
            .get_keygen()?
            .ok_or(ObserverError::KeygenNotFound)?;
        if !keygen.is_pending() {
            return Err(ObserverError::KeygenCompleted);
        }

        let mut batch = WriteBatch::new();
        let outcome = self.keeper.stage_vote(
            &mut batch,
            &msg.digest(),
            ObservationType::TssKeyGen,
            TSS_BALLOT_THRESHOLD,
            &msg.creator,
            msg.status.vote(),
            height,
        )?;
        let completed = if outcome.finalized {
            self.keeper.stage_keygen_completion(
                &mut batch,
                &outcome.ballot,
                msg.keygen_height,
                &msg.tss_pubkey,
                height,
            )?
        } else {
            None
        };
        self.keeper.commit(batch)?;

        outcome.trace();
        match completed {
            Some(tss) => tracing::info!(
                tss_pubkey = %tss.tss_pubkey,
                keygen_height = msg.keygen_height,
                height,
                "keygen completed"
            ),
            None if outcome.finalized => tracing::warn!(
                ballot = %outcome.ballot.ballot_identifier,
                status = ?outcome.ballot.status(),
                "keygen ballot finalized without completing keygen"
            ),
            None => {}
        }
        Ok(response(&outcome))
    }

    // ── Observer set ───────────────────────────────────────────────────

    pub fn add_observer(&self, msg: &MsgAddObserver, height: i64) -> Result<(), ObserverError> {
        self.require_tier(&msg.creator, PolicyTier::Admin)?;
        self.keeper
            .add_observer(msg.observer_address.clone(), height)
    }

    pub fn remove_observer(
        &self,
        msg: &MsgRemoveObserver,
        height: i64,
    ) -> Result<(), ObserverError> {
        self.require_tier(&msg.creator, PolicyTier::Admin)?;
        self.keeper.remove_observer(&msg.observer_address, height)
    }

    pub fn update_observer(
        &self,
        msg: &MsgUpdateObserver,
        height: i64,
    ) -> Result<(), ObserverError> {
        self.require_tier(&msg.creator, PolicyTier::Admin)?;
        self.keeper.update_observer(
            &msg.old_observer_address,
            msg.new_observer_address.clone(),
            height,
        )
    }

    // ── Chain params ───────────────────────────────────────────────────

    pub fn update_chain_params(&self, msg: &MsgUpdateChainParams) -> Result<(), ObserverError> {
        self.require_tier(&msg.creator, PolicyTier::Admin)?;
        self.keeper.update_chain_params(msg.chain_params.clone())
    }

    pub fn remove_chain_params(&self, msg: &MsgRemoveChainParams) -> Result<(), ObserverError> {
        self.require_tier(&msg.creator, PolicyTier::Admin)?;
        self.keeper.remove_chain_params(msg.chain_id)
    }

    // ── Flags ──────────────────────────────────────────────────────────

    /// The tier depends on what changes: switching things off is an
    /// emergency action, anything else is operational.
    pub fn update_crosschain_flags(
        &self,
        msg: &MsgUpdateCrosschainFlags,
    ) -> Result<(), ObserverError> {
        let current = self.keeper.get_crosschain_flags()?.unwrap_or_default();
        let next = CrosschainFlags {
            is_inbound_enabled: msg.is_inbound_enabled,
            is_outbound_enabled: msg.is_outbound_enabled,
            gas_price_increase_flags: msg
                .gas_price_increase_flags
                .clone()
                .or_else(|| current.gas_price_increase_flags.clone()),
            block_header_verification_flags: msg
                .block_header_verification_flags
                .or(current.block_header_verification_flags),
        };
        let tier = current.diff(&next).required_tier();
        self.require_tier(&msg.creator, tier)?;
        self.keeper.set_crosschain_flags(&next)?;
        tracing::info!(
            inbound = next.is_inbound_enabled,
            outbound = next.is_outbound_enabled,
            %tier,
            "crosschain flags updated"
        );
        Ok(())
    }

    pub fn update_operational_flags(
        &self,
        msg: &MsgUpdateOperationalFlags,
    ) -> Result<(), ObserverError> {
        self.require_tier(&msg.creator, PolicyTier::Operational)?;
        self.keeper.set_operational_flags(&msg.operational_flags)
    }

    // ── TSS ────────────────────────────────────────────────────────────

    pub fn add_fund_migration(
        &self,
        msg: &MsgAddFundMigration,
        height: i64,
    ) -> Result<(), ObserverError> {
        self.require_tier(&msg.creator, PolicyTier::Admin)?;
        self.keeper
            .add_fund_migration(msg.chain_id, &msg.old_tss_pubkey, &msg.new_tss_pubkey, height)?;
        Ok(())
    }
}

fn response(outcome: &VoteOutcome) -> VoteResponse {
    VoteResponse {
        ballot_identifier: outcome.ballot.ballot_identifier.clone(),
        ballot_created: outcome.created,
        finalized: outcome.finalized.then(|| outcome.ballot.status()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::PolicyTable;
    use crate::config::ObserverConfig;
    use crate::crosschain_flags::{BlockHeaderVerificationFlags, OperationalFlags};
    use crate::observer_set::ObserverSet;
    use crate::tss::Keygen;
    use xchain_nullables::{sample, NullStore};

    const ADMIN: u64 = 1000;
    const OPERATIONAL: u64 = 1001;
    const EMERGENCY: u64 = 1002;

    fn policies() -> PolicyTable {
        PolicyTable::new()
            .with(PolicyTier::Admin, sample::address(ADMIN))
            .with(PolicyTier::Operational, sample::address(OPERATIONAL))
            .with(PolicyTier::Emergency, sample::address(EMERGENCY))
    }

    fn keeper() -> (Keeper<NullStore>, Vec<Address>) {
        let keeper = Keeper::new(NullStore::new(), ObserverConfig::default());
        let observers = sample::addresses(2);
        keeper
            .set_observer_set(&ObserverSet::new(observers.clone()).unwrap())
            .unwrap();
        keeper
            .set_crosschain_flags(&CrosschainFlags::default())
            .unwrap();
        (keeper, observers)
    }

    fn flags_msg(creator: u64, inbound: bool, outbound: bool) -> MsgUpdateCrosschainFlags {
        MsgUpdateCrosschainFlags {
            creator: sample::address(creator),
            is_inbound_enabled: inbound,
            is_outbound_enabled: outbound,
            gas_price_increase_flags: None,
            block_header_verification_flags: None,
        }
    }

    #[test]
    fn disabling_needs_only_emergency_tier() {
        let (k, _) = keeper();
        let table = policies();
        let server = MsgServer::new(&k, &table);

        server
            .update_crosschain_flags(&flags_msg(EMERGENCY, false, false))
            .unwrap();
        assert!(!k.is_inbound_enabled().unwrap());

        let err = server
            .update_crosschain_flags(&flags_msg(EMERGENCY, true, false))
            .unwrap_err();
        assert!(matches!(
            err,
            ObserverError::Unauthorized {
                tier: PolicyTier::Operational,
                ..
            }
        ));
        server
            .update_crosschain_flags(&flags_msg(OPERATIONAL, true, true))
            .unwrap();
        assert!(k.is_outbound_enabled().unwrap());
    }

    #[test]
    fn omitted_sub_flags_keep_current_values() {
        let (k, _) = keeper();
        let table = policies();
        let server = MsgServer::new(&k, &table);

        let mut msg = flags_msg(OPERATIONAL, true, true);
        msg.block_header_verification_flags = Some(BlockHeaderVerificationFlags {
            is_eth_type_chain_enabled: true,
            is_btc_type_chain_enabled: false,
        });
        server.update_crosschain_flags(&msg).unwrap();

        server
            .update_crosschain_flags(&flags_msg(EMERGENCY, true, true))
            .unwrap();
        let flags = k.get_crosschain_flags().unwrap().unwrap();
        assert!(flags.is_eth_type_header_verification_enabled());
        assert!(flags.gas_price_increase_flags.is_some());
    }

    #[test]
    fn admin_messages_reject_other_tiers() {
        let (k, _) = keeper();
        let table = policies();
        let server = MsgServer::new(&k, &table);
        let msg = Msg::AddObserver(MsgAddObserver {
            creator: sample::address(OPERATIONAL),
            observer_address: sample::address(77),
        });
        assert!(matches!(
            server.handle(&msg, 5),
            Err(ObserverError::Unauthorized { .. })
        ));
        assert!(!k.is_authorized(&sample::address(77)).unwrap());
    }

    #[test]
    fn operational_flags_need_operational_tier() {
        let (k, _) = keeper();
        let table = policies();
        let server = MsgServer::new(&k, &table);
        let flags = OperationalFlags {
            restart_height: 500,
            signer_block_time_offset_ms: Some(1_000),
            minimum_version: "v21.0.0".to_string(),
        };
        let msg = |creator| {
            Msg::UpdateOperationalFlags(MsgUpdateOperationalFlags {
                creator: sample::address(creator),
                operational_flags: flags.clone(),
            })
        };
        assert!(server.handle(&msg(ADMIN), 1).is_err());
        server.handle(&msg(OPERATIONAL), 1).unwrap();
        assert_eq!(k.get_operational_flags().unwrap(), Some(flags.clone()));
    }

    #[test]
    fn tss_vote_requires_pending_keygen() {
        let (k, observers) = keeper();
        let table = policies();
        let server = MsgServer::new(&k, &table);
        let msg = MsgVoteTss {
            creator: observers[0].clone(),
            tss_pubkey: sample::pubkey(3),
            keygen_height: 10,
            status: crate::messages::ReceiveStatus::Success,
        };
        assert!(matches!(
            server.vote_tss(&msg, 11),
            Err(ObserverError::KeygenNotFound)
        ));

        k.set_keygen(&Keygen::pending(vec![], 10)).unwrap();
        server.vote_tss(&msg, 11).unwrap();
        let second = MsgVoteTss {
            creator: observers[1].clone(),
            ..msg.clone()
        };
        let resp = server.vote_tss(&second, 12).unwrap();
        assert!(resp.finalized.is_some());
        assert!(k.get_tss().unwrap().is_some());

        assert!(matches!(
            server.vote_tss(&msg, 13),
            Err(ObserverError::KeygenCompleted)
        ));
    }

    fn tss_votes(observers: &[Address]) -> (MsgVoteTss, MsgVoteTss) {
        let first = MsgVoteTss {
            creator: observers[0].clone(),
            tss_pubkey: sample::pubkey(4),
            keygen_height: 20,
            status: crate::messages::ReceiveStatus::Success,
        };
        let second = MsgVoteTss {
            creator: observers[1].clone(),
            ..first.clone()
        };
        (first, second)
    }

    #[test]
    fn finalizing_tss_vote_is_one_commit() {
        let (k, observers) = keeper();
        let table = policies();
        let server = MsgServer::new(&k, &table);
        k.set_keygen(&Keygen::pending(vec![], 20)).unwrap();
        let (first, second) = tss_votes(&observers);
        server.vote_tss(&first, 21).unwrap();

        let commits = k.store().commits();
        server.vote_tss(&second, 22).unwrap();
        assert_eq!(k.store().commits(), commits + 1);
        assert!(!k.get_keygen().unwrap().unwrap().is_pending());
        assert_eq!(k.get_all_tss_history().unwrap().len(), 1);
    }

    #[test]
    fn failed_tss_commit_keeps_keygen_pending() {
        let (k, observers) = keeper();
        let table = policies();
        let server = MsgServer::new(&k, &table);
        k.set_keygen(&Keygen::pending(vec![], 20)).unwrap();
        let (first, second) = tss_votes(&observers);
        let id = server.vote_tss(&first, 21).unwrap().ballot_identifier;

        k.store().fail_next_commit();
        assert!(matches!(
            server.vote_tss(&second, 22),
            Err(ObserverError::Store(_))
        ));
        assert!(k.get_keygen().unwrap().unwrap().is_pending());
        assert!(k.get_tss().unwrap().is_none());
        assert!(k.get_all_tss_history().unwrap().is_empty());
        let ballot = k.get_ballot(&id).unwrap().unwrap();
        assert!(!ballot.has_voted(&observers[1]));

        let resp = server.vote_tss(&second, 22).unwrap();
        assert!(resp.finalized.is_some());
        assert!(k.get_tss().unwrap().is_some());
    }

    #[test]
    fn non_observer_cannot_vote() {
        let (k, _) = keeper();
        let table = policies();
        let server = MsgServer::new(&k, &table);
        let msg = MsgVoteTss {
            creator: sample::address(500),
            tss_pubkey: "pk".to_string(),
            keygen_height: 1,
            status: crate::messages::ReceiveStatus::Success,
        };
        assert!(matches!(
            server.vote_tss(&msg, 1),
            Err(ObserverError::NotAuthorizedObserver(_))
        ));
    }
}
