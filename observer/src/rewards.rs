//! Observer reward distribution over matured ballots.
//!
//! Each finalized ballot gives its voters +1 unit for voting with the outcome
//! and −1 otherwise ([`Ballot::build_rewards_distribution`]). The summed units
//! are then turned into emissions:
//! - Positive units earn `units × (pool / total_units)`
//! - Negative units are slashed a fixed amount
//! - Zero units earn nothing

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use xchain_types::Address;

use crate::ballot::Ballot;

/// Reward units accrued per observer over a set of ballots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardsDistribution {
    pub units: BTreeMap<Address, i64>,
    /// Sum of matching votes over all ballots.
    pub total_units: i64,
}

/// What one observer receives from a distribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emission {
    Reward(u128),
    Slash(u128),
    None,
}

/// What one block's maturity settlement produced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Units accrued over the ballots that reached maturity.
    pub distribution: RewardsDistribution,
    /// The block's reward pool split over those units.
    pub emissions: BTreeMap<Address, Emission>,
    /// Ballots swept from the store.
    pub deleted: usize,
}

impl RewardsDistribution {
    /// Accrue units over `ballots` in order.
    pub fn from_ballots<'a>(ballots: impl IntoIterator<Item = &'a Ballot>) -> Self {
        let mut dist = Self::default();
        for ballot in ballots {
            dist.add_ballot(ballot);
        }
        dist
    }

    pub fn add_ballot(&mut self, ballot: &Ballot) {
        self.total_units += ballot.build_rewards_distribution(&mut self.units);
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Split `pool` over observers with positive units and slash those with
    /// negative units by `slash_amount`.
    ///
    /// The per-unit reward is rounded down; the remainder stays in the pool.
    pub fn allocate(&self, pool: u128, slash_amount: u128) -> BTreeMap<Address, Emission> {
        let reward_per_unit = if self.total_units > 0 {
            pool / self.total_units as u128
        } else {
            0
        };

        self.units
            .iter()
            .map(|(addr, units)| {
                let emission = match *units {
                    u if u > 0 => Emission::Reward(reward_per_unit.saturating_mul(u as u128)),
                    u if u < 0 => Emission::Slash(slash_amount),
                    _ => Emission::None,
                };
                (addr.clone(), emission)
            })
            .collect()
    }
}
