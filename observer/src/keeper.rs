//! Observer keeper: typed access to observer state over the byte-valued
//! store traits.
//!
//! Every record is bincode-encoded. Ballots are also indexed by creation
//! height so matured ballots can be settled and swept in batches.
//!
//! Writes are staged into a [`WriteBatch`] and committed once per operation.
//! The `stage_*` methods add records to a caller's batch so several
//! operations can share one commit; the `set_*` methods commit on their own.

use serde::de::DeserializeOwned;
use serde::Serialize;
use xchain_store::{ObserverStateStore, WriteBatch};
use xchain_types::{Address, ChainId, Decimal};

use crate::ballot::{Ballot, ObservationType, VoteType};
use crate::chain_params::{ChainParams, ChainParamsList};
use crate::config::ObserverConfig;
use crate::crosschain_flags::{CrosschainFlags, OperationalFlags};
use crate::error::ObserverError;
use crate::observer_set::{LastObserverCount, ObserverSet};
use crate::rewards::{RewardsDistribution, Settlement};
use crate::tss::{FundMigrationRecord, Keygen, Tss};

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ObserverError> {
    Ok(bincode::serialize(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ObserverError> {
    Ok(bincode::deserialize(bytes)?)
}

fn decode_opt<T: DeserializeOwned>(bytes: Option<Vec<u8>>) -> Result<Option<T>, ObserverError> {
    bytes.map(|b| decode(&b)).transpose()
}

/// Result of applying one vote.
#[derive(Clone, Debug)]
pub struct VoteOutcome {
    /// The ballot as persisted after the vote.
    pub ballot: Ballot,
    /// The vote created the ballot.
    pub created: bool,
    /// The vote finalized the ballot.
    pub finalized: bool,
}

impl VoteOutcome {
    pub(crate) fn trace(&self) {
        let ballot = &self.ballot;
        if self.created {
            tracing::debug!(
                ballot = %ballot.ballot_identifier,
                voters = ballot.voter_list().len(),
                threshold = %ballot.ballot_threshold,
                height = ballot.ballot_creation_height,
                "ballot created"
            );
        }
        if self.finalized {
            tracing::info!(
                ballot = %ballot.ballot_identifier,
                status = ?ballot.status(),
                success = ballot.success_count(),
                failure = ballot.failure_count(),
                "ballot finalized"
            );
        }
    }
}

/// Typed facade over an [`ObserverStateStore`].
pub struct Keeper<S> {
    store: S,
    config: ObserverConfig,
}

impl<S: ObserverStateStore> Keeper<S> {
    pub fn new(store: S, config: ObserverConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// Persist `batch` as one unit. An empty batch is not sent to the store.
    pub fn commit(&self, batch: WriteBatch) -> Result<(), ObserverError> {
        if !batch.is_empty() {
            self.store.commit_batch(batch)?;
        }
        Ok(())
    }

    /// Stage writes with `stage` and commit them together.
    fn write<T>(
        &self,
        stage: impl FnOnce(&mut WriteBatch) -> Result<T, ObserverError>,
    ) -> Result<T, ObserverError> {
        let mut batch = WriteBatch::new();
        let out = stage(&mut batch)?;
        self.commit(batch)?;
        Ok(out)
    }

    // ── Ballots ────────────────────────────────────────────────────────

    pub fn get_ballot(&self, identifier: &str) -> Result<Option<Ballot>, ObserverError> {
        decode_opt(self.store.get_ballot(identifier)?)
    }

    pub fn stage_ballot(
        &self,
        batch: &mut WriteBatch,
        ballot: &Ballot,
    ) -> Result<(), ObserverError> {
        batch.put_ballot(&ballot.ballot_identifier, encode(ballot)?);
        Ok(())
    }

    pub fn set_ballot(&self, ballot: &Ballot) -> Result<(), ObserverError> {
        self.write(|batch| self.stage_ballot(batch, ballot))
    }

    /// Every stored ballot, ordered by identifier.
    pub fn get_all_ballots(&self) -> Result<Vec<Ballot>, ObserverError> {
        self.store
            .list_ballots()?
            .into_iter()
            .map(|(_, bytes)| decode(&bytes))
            .collect()
    }

    /// Ballot identifiers created at `height`; empty when none.
    pub fn get_ballot_list(&self, height: i64) -> Result<Vec<String>, ObserverError> {
        Ok(decode_opt::<Vec<String>>(self.store.get_ballot_list(height)?)?.unwrap_or_default())
    }

    /// Stage the index entry for `height`, or its removal when `identifiers`
    /// is empty.
    pub fn stage_ballot_list(
        &self,
        batch: &mut WriteBatch,
        height: i64,
        identifiers: &[String],
    ) -> Result<(), ObserverError> {
        if identifiers.is_empty() {
            batch.delete_ballot_list(height);
        } else {
            batch.put_ballot_list(height, encode(&identifiers.to_vec())?);
        }
        Ok(())
    }

    /// Load a ballot, or build a new one over the current observer set.
    ///
    /// A new ballot is not persisted; the flag says whether it was created.
    pub fn find_ballot(
        &self,
        identifier: &str,
        observation_type: ObservationType,
        threshold: Decimal,
        height: i64,
    ) -> Result<(Ballot, bool), ObserverError> {
        if let Some(ballot) = self.get_ballot(identifier)? {
            return Ok((ballot, false));
        }
        let observers = self
            .get_observer_set()?
            .ok_or(ObserverError::ObserverSetNotFound)?;
        if observers.is_empty() {
            return Err(ObserverError::EmptyObserverSet);
        }
        let ballot = Ballot::new(
            identifier,
            observers.snapshot(),
            observation_type,
            threshold,
            height,
        );
        Ok((ballot, true))
    }

    /// Apply `voter`'s vote to the ballot, creating it if needed, and try to
    /// finalize it.
    ///
    /// The ballot and, for a new ballot, its index entry are committed
    /// together. Nothing is written unless the vote is accepted.
    pub fn vote_on_ballot(
        &self,
        identifier: &str,
        observation_type: ObservationType,
        threshold: Decimal,
        voter: &Address,
        vote: VoteType,
        height: i64,
    ) -> Result<VoteOutcome, ObserverError> {
        let outcome = self.write(|batch| {
            self.stage_vote(batch, identifier, observation_type, threshold, voter, vote, height)
        })?;
        outcome.trace();
        Ok(outcome)
    }

    /// [`Keeper::vote_on_ballot`] into a caller's batch.
    #[allow(clippy::too_many_arguments)]
    pub fn stage_vote(
        &self,
        batch: &mut WriteBatch,
        identifier: &str,
        observation_type: ObservationType,
        threshold: Decimal,
        voter: &Address,
        vote: VoteType,
        height: i64,
    ) -> Result<VoteOutcome, ObserverError> {
        let (mut ballot, created) =
            self.find_ballot(identifier, observation_type, threshold, height)?;
        ballot.add_vote(voter, vote)?;
        let finalized = ballot.try_finalize();

        self.stage_ballot(batch, &ballot)?;
        if created {
            let mut list = self.get_ballot_list(height)?;
            if !list.iter().any(|id| id == identifier) {
                list.push(identifier.to_string());
                self.stage_ballot_list(batch, height, &list)?;
            }
        }
        Ok(VoteOutcome {
            ballot,
            created,
            finalized,
        })
    }

    // ── Observer set ───────────────────────────────────────────────────

    pub fn get_observer_set(&self) -> Result<Option<ObserverSet>, ObserverError> {
        decode_opt(self.store.get_observer_set()?)
    }

    pub fn stage_observer_set(
        &self,
        batch: &mut WriteBatch,
        set: &ObserverSet,
    ) -> Result<(), ObserverError> {
        set.validate()?;
        batch.put_observer_set(encode(set)?);
        Ok(())
    }

    pub fn set_observer_set(&self, set: &ObserverSet) -> Result<(), ObserverError> {
        self.write(|batch| self.stage_observer_set(batch, set))
    }

    pub fn get_last_observer_count(&self) -> Result<Option<LastObserverCount>, ObserverError> {
        decode_opt(self.store.get_last_observer_count()?)
    }

    pub fn stage_last_observer_count(
        &self,
        batch: &mut WriteBatch,
        count: &LastObserverCount,
    ) -> Result<(), ObserverError> {
        batch.put_last_observer_count(encode(count)?);
        Ok(())
    }

    pub fn set_last_observer_count(&self, count: &LastObserverCount) -> Result<(), ObserverError> {
        self.write(|batch| self.stage_last_observer_count(batch, count))
    }

    /// Whether `address` is well formed and in the observer set.
    pub fn is_authorized(&self, address: &Address) -> Result<bool, ObserverError> {
        if !address.is_valid() {
            return Ok(false);
        }
        Ok(self
            .get_observer_set()?
            .is_some_and(|set| set.contains(address)))
    }

    /// The roster and its recorded size, committed together.
    fn commit_roster(&self, set: &ObserverSet, height: i64) -> Result<(), ObserverError> {
        self.write(|batch| {
            self.stage_observer_set(batch, set)?;
            self.stage_last_observer_count(
                batch,
                &LastObserverCount {
                    count: set.len() as u64,
                    last_change_height: height,
                },
            )
        })
    }

    pub fn add_observer(&self, address: Address, height: i64) -> Result<(), ObserverError> {
        let mut set = self.get_observer_set()?.unwrap_or_default();
        set.add(address.clone())?;
        self.commit_roster(&set, height)?;
        tracing::info!(observer = %address, count = set.len(), height, "observer added");
        Ok(())
    }

    pub fn remove_observer(&self, address: &Address, height: i64) -> Result<(), ObserverError> {
        let mut set = self
            .get_observer_set()?
            .ok_or(ObserverError::ObserverSetNotFound)?;
        set.remove(address)?;
        self.commit_roster(&set, height)?;
        tracing::info!(observer = %address, count = set.len(), height, "observer removed");
        Ok(())
    }

    /// Swap `old` for `new`, keeping its position in the roster.
    pub fn update_observer(
        &self,
        old: &Address,
        new: Address,
        height: i64,
    ) -> Result<(), ObserverError> {
        let mut set = self
            .get_observer_set()?
            .ok_or(ObserverError::ObserverSetNotFound)?;
        set.replace(old, new.clone())?;
        self.commit_roster(&set, height)?;
        tracing::info!(old = %old, new = %new, height, "observer replaced");
        Ok(())
    }

    /// Compare the roster size with the last recorded count.
    ///
    /// On mismatch inbound and outbound processing are disabled and `true` is
    /// returned; the recorded count is left as is. A missing count is
    /// recorded at `height`. A missing roster is nothing to check.
    pub fn reconcile_observer_count(&self, height: i64) -> Result<bool, ObserverError> {
        let Some(set) = self.get_observer_set()? else {
            return Ok(false);
        };
        let current = set.len() as u64;
        match self.get_last_observer_count()? {
            None => {
                self.set_last_observer_count(&LastObserverCount {
                    count: current,
                    last_change_height: height,
                })?;
                Ok(false)
            }
            Some(last) if last.count == current => Ok(false),
            Some(last) => {
                tracing::warn!(
                    expected = last.count,
                    actual = current,
                    last_change_height = last.last_change_height,
                    height,
                    "observer count drift, disabling inbound and outbound"
                );
                self.disable_inbound_and_outbound()?;
                Ok(true)
            }
        }
    }

    // ── Chain params ───────────────────────────────────────────────────

    pub fn get_chain_params_list(&self) -> Result<Option<ChainParamsList>, ObserverError> {
        decode_opt(self.store.get_chain_params_list()?)
    }

    /// Validate and stage the whole list.
    pub fn stage_chain_params_list(
        &self,
        batch: &mut WriteBatch,
        list: &ChainParamsList,
    ) -> Result<(), ObserverError> {
        list.validate()?;
        batch.put_chain_params_list(encode(list)?);
        Ok(())
    }

    pub fn set_chain_params_list(&self, list: &ChainParamsList) -> Result<(), ObserverError> {
        self.write(|batch| self.stage_chain_params_list(batch, list))
    }

    pub fn get_chain_params(
        &self,
        chain_id: ChainId,
    ) -> Result<Option<ChainParams>, ObserverError> {
        Ok(self
            .get_chain_params_list()?
            .and_then(|list| list.get(chain_id).cloned()))
    }

    /// Params of a supported chain, [`ObserverError::UnsupportedChain`]
    /// otherwise.
    pub fn get_supported_chain_params(
        &self,
        chain_id: ChainId,
    ) -> Result<ChainParams, ObserverError> {
        self.get_chain_params_list()?
            .and_then(|list| list.get_supported(chain_id).cloned())
            .ok_or(ObserverError::UnsupportedChain(chain_id))
    }

    /// Insert or replace the params of one chain. The resulting list is
    /// validated before anything is written.
    pub fn update_chain_params(&self, params: ChainParams) -> Result<(), ObserverError> {
        let chain_id = params.chain_id;
        let mut list = self.get_chain_params_list()?.unwrap_or_default();
        list.upsert(params);
        self.set_chain_params_list(&list)?;
        tracing::info!(chain = %chain_id, "chain params updated");
        Ok(())
    }

    pub fn remove_chain_params(&self, chain_id: ChainId) -> Result<(), ObserverError> {
        let mut list = self
            .get_chain_params_list()?
            .ok_or(ObserverError::ChainParamsNotFound(chain_id))?;
        if !list.remove(chain_id) {
            return Err(ObserverError::ChainParamsNotFound(chain_id));
        }
        self.set_chain_params_list(&list)?;
        tracing::info!(chain = %chain_id, "chain params removed");
        Ok(())
    }

    // ── Flags ──────────────────────────────────────────────────────────

    pub fn get_crosschain_flags(&self) -> Result<Option<CrosschainFlags>, ObserverError> {
        decode_opt(self.store.get_crosschain_flags()?)
    }

    pub fn stage_crosschain_flags(
        &self,
        batch: &mut WriteBatch,
        flags: &CrosschainFlags,
    ) -> Result<(), ObserverError> {
        flags.validate()?;
        batch.put_crosschain_flags(encode(flags)?);
        Ok(())
    }

    pub fn set_crosschain_flags(&self, flags: &CrosschainFlags) -> Result<(), ObserverError> {
        self.write(|batch| self.stage_crosschain_flags(batch, flags))
    }

    pub fn get_operational_flags(&self) -> Result<Option<OperationalFlags>, ObserverError> {
        decode_opt(self.store.get_operational_flags()?)
    }

    pub fn stage_operational_flags(
        &self,
        batch: &mut WriteBatch,
        flags: &OperationalFlags,
    ) -> Result<(), ObserverError> {
        flags.validate()?;
        batch.put_operational_flags(encode(flags)?);
        Ok(())
    }

    pub fn set_operational_flags(&self, flags: &OperationalFlags) -> Result<(), ObserverError> {
        self.write(|batch| self.stage_operational_flags(batch, flags))
    }

    /// False when no flags are stored.
    pub fn is_inbound_enabled(&self) -> Result<bool, ObserverError> {
        Ok(self
            .get_crosschain_flags()?
            .is_some_and(|f| f.is_inbound_enabled))
    }

    /// False when no flags are stored.
    pub fn is_outbound_enabled(&self) -> Result<bool, ObserverError> {
        Ok(self
            .get_crosschain_flags()?
            .is_some_and(|f| f.is_outbound_enabled))
    }

    /// Switch off inbound and outbound processing, keeping the other flags.
    pub fn disable_inbound_and_outbound(&self) -> Result<(), ObserverError> {
        let mut flags = self.get_crosschain_flags()?.unwrap_or_default();
        flags.is_inbound_enabled = false;
        flags.is_outbound_enabled = false;
        self.set_crosschain_flags(&flags)
    }

    // ── TSS ────────────────────────────────────────────────────────────

    pub fn get_keygen(&self) -> Result<Option<Keygen>, ObserverError> {
        decode_opt(self.store.get_keygen()?)
    }

    pub fn stage_keygen(
        &self,
        batch: &mut WriteBatch,
        keygen: &Keygen,
    ) -> Result<(), ObserverError> {
        batch.put_keygen(encode(keygen)?);
        Ok(())
    }

    pub fn set_keygen(&self, keygen: &Keygen) -> Result<(), ObserverError> {
        self.write(|batch| self.stage_keygen(batch, keygen))
    }

    pub fn get_tss(&self) -> Result<Option<Tss>, ObserverError> {
        decode_opt(self.store.get_tss()?)
    }

    pub fn stage_tss(&self, batch: &mut WriteBatch, tss: &Tss) -> Result<(), ObserverError> {
        batch.put_tss(encode(tss)?);
        Ok(())
    }

    pub fn set_tss(&self, tss: &Tss) -> Result<(), ObserverError> {
        self.write(|batch| self.stage_tss(batch, tss))
    }

    pub fn stage_tss_history(
        &self,
        batch: &mut WriteBatch,
        tss: &Tss,
    ) -> Result<(), ObserverError> {
        batch.put_tss_history(tss.finalized_height, &tss.tss_pubkey, encode(tss)?);
        Ok(())
    }

    pub fn append_tss_history(&self, tss: &Tss) -> Result<(), ObserverError> {
        self.write(|batch| self.stage_tss_history(batch, tss))
    }

    /// Historical keys, oldest first.
    pub fn get_all_tss_history(&self) -> Result<Vec<Tss>, ObserverError> {
        self.store
            .list_tss_history()?
            .iter()
            .map(|bytes| decode(bytes))
            .collect()
    }

    pub fn find_tss_in_history(&self, tss_pubkey: &str) -> Result<Option<Tss>, ObserverError> {
        Ok(self
            .get_all_tss_history()?
            .into_iter()
            .find(|t| t.tss_pubkey == tss_pubkey))
    }

    /// Apply a keygen ballot to the pending keygen.
    ///
    /// On success the keygen is marked successful, the key is appended to
    /// history and becomes the active key if none is set. All three records
    /// are committed together.
    pub fn complete_keygen(
        &self,
        ballot: &Ballot,
        keygen_height: i64,
        tss_pubkey: &str,
        height: i64,
    ) -> Result<Option<Tss>, ObserverError> {
        let tss = self.write(|batch| {
            self.stage_keygen_completion(batch, ballot, keygen_height, tss_pubkey, height)
        })?;
        if tss.is_some() {
            tracing::info!(tss_pubkey, keygen_height, height, "keygen completed");
        }
        Ok(tss)
    }

    /// [`Keeper::complete_keygen`] into a caller's batch.
    pub fn stage_keygen_completion(
        &self,
        batch: &mut WriteBatch,
        ballot: &Ballot,
        keygen_height: i64,
        tss_pubkey: &str,
        height: i64,
    ) -> Result<Option<Tss>, ObserverError> {
        let mut keygen = self.get_keygen()?.ok_or(ObserverError::KeygenNotFound)?;
        let Some(tss) = keygen.complete(ballot, keygen_height, tss_pubkey, height) else {
            return Ok(None);
        };
        self.stage_keygen(batch, &keygen)?;
        self.stage_tss_history(batch, &tss)?;
        if self.get_tss()?.is_none() {
            self.stage_tss(batch, &tss)?;
        }
        Ok(Some(tss))
    }

    pub fn get_fund_migrator(
        &self,
        chain_id: ChainId,
    ) -> Result<Option<FundMigrationRecord>, ObserverError> {
        decode_opt(self.store.get_fund_migrator(chain_id)?)
    }

    pub fn stage_fund_migrator(
        &self,
        batch: &mut WriteBatch,
        record: &FundMigrationRecord,
    ) -> Result<(), ObserverError> {
        batch.put_fund_migrator(record.chain_id, encode(record)?);
        Ok(())
    }

    pub fn set_fund_migrator(&self, record: &FundMigrationRecord) -> Result<(), ObserverError> {
        self.write(|batch| self.stage_fund_migrator(batch, record))
    }

    /// All fund migration records, ordered by chain id.
    pub fn get_all_fund_migrators(&self) -> Result<Vec<FundMigrationRecord>, ObserverError> {
        self.store
            .list_fund_migrators()?
            .iter()
            .map(|bytes| decode(bytes))
            .collect()
    }

    /// Record a migration of funds on `chain_id` between two historical keys.
    ///
    /// Records are append-only: one per chain.
    pub fn add_fund_migration(
        &self,
        chain_id: ChainId,
        old_tss_pubkey: &str,
        new_tss_pubkey: &str,
        height: i64,
    ) -> Result<FundMigrationRecord, ObserverError> {
        if self.get_fund_migrator(chain_id)?.is_some() {
            return Err(ObserverError::FundMigrationExists(chain_id));
        }
        if old_tss_pubkey == new_tss_pubkey {
            return Err(ObserverError::FundMigrationSameKey);
        }
        for key in [old_tss_pubkey, new_tss_pubkey] {
            if self.find_tss_in_history(key)?.is_none() {
                return Err(ObserverError::TssHistoryNotFound(key.to_string()));
            }
        }
        let record = FundMigrationRecord {
            chain_id,
            old_tss_pubkey: old_tss_pubkey.to_string(),
            new_tss_pubkey: new_tss_pubkey.to_string(),
            migration_height: height,
        };
        self.set_fund_migrator(&record)?;
        tracing::info!(chain = %chain_id, height, "fund migration recorded");
        Ok(record)
    }

    // ── Maturity sweep ─────────────────────────────────────────────────

    /// Ballots created exactly `maturity` blocks before `height`.
    pub fn matured_ballots(
        &self,
        height: i64,
        maturity: i64,
    ) -> Result<Vec<Ballot>, ObserverError> {
        let Some(target) = height.checked_sub(maturity).filter(|h| *h >= 0) else {
            return Ok(Vec::new());
        };
        let mut ballots = Vec::new();
        for id in self.get_ballot_list(target)? {
            if let Some(ballot) = self.get_ballot(&id)? {
                ballots.push(ballot);
            }
        }
        Ok(ballots)
    }

    /// Delete matured ballots. Finalized ballots always go; in-progress ones
    /// only with `force`. The index entry is rewritten with the survivors or
    /// removed when none remain, in the same commit as the deletions.
    /// Returns the number of ballots deleted.
    pub fn clear_matured_ballots(
        &self,
        height: i64,
        maturity: i64,
        force: bool,
    ) -> Result<usize, ObserverError> {
        let deleted =
            self.write(|batch| self.stage_clear_matured_ballots(batch, height, maturity, force))?;
        if deleted > 0 {
            tracing::debug!(height, maturity, deleted, force, "matured ballots cleared");
        }
        Ok(deleted)
    }

    /// [`Keeper::clear_matured_ballots`] into a caller's batch.
    pub fn stage_clear_matured_ballots(
        &self,
        batch: &mut WriteBatch,
        height: i64,
        maturity: i64,
        force: bool,
    ) -> Result<usize, ObserverError> {
        let Some(target) = height.checked_sub(maturity).filter(|h| *h >= 0) else {
            return Ok(0);
        };
        let ids = self.get_ballot_list(target)?;
        if ids.is_empty() {
            return Ok(0);
        }

        let mut survivors = Vec::new();
        let mut deleted = 0;
        for id in ids {
            match self.get_ballot(&id)? {
                Some(ballot) if !force && !ballot.status().is_finalized() => survivors.push(id),
                Some(_) => {
                    batch.delete_ballot(&id);
                    deleted += 1;
                }
                None => {}
            }
        }
        self.stage_ballot_list(batch, target, &survivors)?;
        Ok(deleted)
    }

    /// End-of-block maintenance for matured ballots.
    ///
    /// Reward units are accrued over the ballots reaching maturity and
    /// `reward_pool` is allocated over them, slashing wrong or missing votes
    /// by the configured amount. Then finalized ballots at maturity and
    /// everything left at maturity plus the pending buffer are swept, all in
    /// one commit.
    pub fn settle_matured_ballots(
        &self,
        height: i64,
        reward_pool: u128,
    ) -> Result<Settlement, ObserverError> {
        let maturity = self.config.ballot_maturity_blocks;
        let matured = self.matured_ballots(height, maturity)?;
        let distribution = RewardsDistribution::from_ballots(&matured);
        let emissions =
            distribution.allocate(reward_pool, u128::from(self.config.observer_slash_amount));

        let forced = maturity.saturating_add(self.config.pending_ballots_deletion_buffer_blocks);
        let deleted = self.write(|batch| {
            // With no buffer both sweeps hit one height and the forced one
            // covers it.
            let mut deleted = 0;
            if forced != maturity {
                deleted += self.stage_clear_matured_ballots(batch, height, maturity, false)?;
            }
            deleted += self.stage_clear_matured_ballots(batch, height, forced, true)?;
            Ok(deleted)
        })?;

        if !matured.is_empty() || deleted > 0 {
            tracing::debug!(
                height,
                matured = matured.len(),
                rewarded = emissions.len(),
                total_units = distribution.total_units,
                deleted,
                "matured ballots settled"
            );
        }
        Ok(Settlement {
            distribution,
            emissions,
            deleted,
        })
    }

    /// Per-block maintenance: drift check, then maturity settlement of this
    /// block's observer `reward_pool`.
    pub fn end_block(&self, height: i64, reward_pool: u128) -> Result<Settlement, ObserverError> {
        self.reconcile_observer_count(height)?;
        self.settle_matured_ballots(height, reward_pool)
    }
}
