//! Genesis state: the observer module's full state as a JSON document.
//!
//! [`init_genesis`] writes a validated state through the keeper and
//! [`export_genesis`] reads it back, so an export can seed a new chain.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use xchain_store::{ObserverStateStore, WriteBatch};

use crate::ballot::Ballot;
use crate::chain_params::{default_chain_params, ChainParamsList};
use crate::config::ObserverConfig;
use crate::crosschain_flags::{CrosschainFlags, OperationalFlags};
use crate::error::ObserverError;
use crate::keeper::Keeper;
use crate::observer_set::{LastObserverCount, ObserverSet};
use crate::tss::{FundMigrationRecord, Keygen, Tss};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub observer_set: Option<ObserverSet>,
    #[serde(default)]
    pub last_observer_count: Option<LastObserverCount>,
    #[serde(default)]
    pub chain_params_list: ChainParamsList,
    #[serde(default)]
    pub crosschain_flags: Option<CrosschainFlags>,
    #[serde(default)]
    pub operational_flags: Option<OperationalFlags>,
    #[serde(default)]
    pub keygen: Option<Keygen>,
    #[serde(default)]
    pub tss: Option<Tss>,
    #[serde(default)]
    pub tss_history: Vec<Tss>,
    #[serde(default)]
    pub fund_migrators: Vec<FundMigrationRecord>,
    #[serde(default)]
    pub ballots: Vec<Ballot>,
}

impl GenesisState {
    /// Default chain params for every known external chain, all switched
    /// off, and processing enabled.
    pub fn default_for(config: &ObserverConfig) -> Self {
        Self {
            chain_params_list: default_chain_params(config.default_ballot_threshold),
            crosschain_flags: Some(CrosschainFlags::default()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ObserverError> {
        if let Some(set) = &self.observer_set {
            set.validate()?;
        }
        self.chain_params_list.validate()?;
        if let Some(flags) = &self.crosschain_flags {
            flags.validate()?;
        }
        if let Some(flags) = &self.operational_flags {
            flags.validate()?;
        }

        let history: BTreeSet<&str> = self
            .tss_history
            .iter()
            .map(|t| t.tss_pubkey.as_str())
            .collect();
        if history.len() != self.tss_history.len() {
            return Err(ObserverError::Genesis("duplicate key in tss history".into()));
        }
        if let Some(tss) = &self.tss {
            if !history.contains(tss.tss_pubkey.as_str()) {
                return Err(ObserverError::TssHistoryNotFound(tss.tss_pubkey.clone()));
            }
        }
        let mut chains = BTreeSet::new();
        for record in &self.fund_migrators {
            if !chains.insert(record.chain_id) {
                return Err(ObserverError::FundMigrationExists(record.chain_id));
            }
            for key in [&record.old_tss_pubkey, &record.new_tss_pubkey] {
                if !history.contains(key.as_str()) {
                    return Err(ObserverError::TssHistoryNotFound(key.clone()));
                }
            }
        }

        let mut ids = BTreeSet::new();
        for ballot in &self.ballots {
            ballot.validate()?;
            if !ids.insert(ballot.ballot_identifier.as_str()) {
                return Err(ObserverError::Genesis(format!(
                    "duplicate ballot {}",
                    ballot.ballot_identifier
                )));
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ObserverError> {
        let state: Self = serde_json::from_str(json)?;
        state.validate()?;
        Ok(state)
    }

    pub fn to_json(&self) -> Result<String, ObserverError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Validate `state` and write it into an empty store in one commit.
///
/// Ballots are re-indexed by creation height. When no observer count is
/// given, the roster size is recorded at height zero.
pub fn init_genesis<S: ObserverStateStore>(
    keeper: &Keeper<S>,
    state: &GenesisState,
) -> Result<(), ObserverError> {
    state.validate()?;

    let mut batch = WriteBatch::new();
    if let Some(set) = &state.observer_set {
        keeper.stage_observer_set(&mut batch, set)?;
    }
    match (&state.last_observer_count, &state.observer_set) {
        (Some(count), _) => keeper.stage_last_observer_count(&mut batch, count)?,
        (None, Some(set)) => keeper.stage_last_observer_count(
            &mut batch,
            &LastObserverCount {
                count: set.len() as u64,
                last_change_height: 0,
            },
        )?,
        (None, None) => {}
    }
    keeper.stage_chain_params_list(&mut batch, &state.chain_params_list)?;
    if let Some(flags) = &state.crosschain_flags {
        keeper.stage_crosschain_flags(&mut batch, flags)?;
    }
    if let Some(flags) = &state.operational_flags {
        keeper.stage_operational_flags(&mut batch, flags)?;
    }
    if let Some(keygen) = &state.keygen {
        keeper.stage_keygen(&mut batch, keygen)?;
    }
    if let Some(tss) = &state.tss {
        keeper.stage_tss(&mut batch, tss)?;
    }
    for tss in &state.tss_history {
        keeper.stage_tss_history(&mut batch, tss)?;
    }
    for record in &state.fund_migrators {
        keeper.stage_fund_migrator(&mut batch, record)?;
    }

    let mut index: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    for ballot in &state.ballots {
        keeper.stage_ballot(&mut batch, ballot)?;
        index
            .entry(ballot.ballot_creation_height)
            .or_default()
            .push(ballot.ballot_identifier.clone());
    }
    for (height, ids) in &index {
        keeper.stage_ballot_list(&mut batch, *height, ids)?;
    }
    keeper.commit(batch)?;

    tracing::info!(
        observers = state.observer_set.as_ref().map_or(0, ObserverSet::len),
        chains = state.chain_params_list.chain_params.len(),
        ballots = state.ballots.len(),
        "observer genesis initialized"
    );
    Ok(())
}

pub fn export_genesis<S: ObserverStateStore>(
    keeper: &Keeper<S>,
) -> Result<GenesisState, ObserverError> {
    Ok(GenesisState {
        observer_set: keeper.get_observer_set()?,
        last_observer_count: keeper.get_last_observer_count()?,
        chain_params_list: keeper.get_chain_params_list()?.unwrap_or_default(),
        crosschain_flags: keeper.get_crosschain_flags()?,
        operational_flags: keeper.get_operational_flags()?,
        keygen: keeper.get_keygen()?,
        tss: keeper.get_tss()?,
        tss_history: keeper.get_all_tss_history()?,
        fund_migrators: keeper.get_all_fund_migrators()?,
        ballots: keeper.get_all_ballots()?,
    })
}
