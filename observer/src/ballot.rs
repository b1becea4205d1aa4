//! Ballot state machine: collects observer votes on a single observed event.
//!
//! A ballot is created the first time any observer reports an event. The
//! voter list is a snapshot of the observer set at that moment and never
//! changes afterwards; each voter owns one slot in `votes`, at the same index.
//!
//! Finalization compares vote counts against the full voter list, abstainers
//! included:
//!
//! ```text
//! failure / len(voter_list) >= threshold  → FinalizedFailureObservation
//! success / len(voter_list) >= threshold  → FinalizedSuccessObservation
//! ```
//!
//! Failure is checked first. Both states are terminal.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use xchain_types::{Address, Decimal};

use crate::error::ObserverError;

/// A single observer's vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteType {
    SuccessObservation,
    FailureObservation,
    NotYetVoted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BallotStatus {
    FinalizedSuccessObservation,
    FinalizedFailureObservation,
    InProgress,
}

impl BallotStatus {
    pub fn is_finalized(&self) -> bool {
        !matches!(self, BallotStatus::InProgress)
    }
}

/// What kind of event the ballot is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    Empty,
    InboundTx,
    OutboundTx,
    TssKeyGen,
    TssKeySign,
}

/// Votes on one observed event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    /// Deterministic identifier derived from the observed event.
    pub ballot_identifier: String,
    voter_list: Vec<Address>,
    votes: Vec<VoteType>,
    pub observation_type: ObservationType,
    /// Fraction of the voter list that must agree to finalize.
    pub ballot_threshold: Decimal,
    ballot_status: BallotStatus,
    /// Block height at which the ballot was created.
    pub ballot_creation_height: i64,
}

impl Ballot {
    /// Create an in-progress ballot with every slot set to `NotYetVoted`.
    ///
    /// `voter_list` is the observer set snapshot and must not contain
    /// duplicates; [`Ballot::validate`] checks this for ballots read from
    /// untrusted sources.
    pub fn new(
        ballot_identifier: impl Into<String>,
        voter_list: Vec<Address>,
        observation_type: ObservationType,
        ballot_threshold: Decimal,
        ballot_creation_height: i64,
    ) -> Self {
        let votes = vec![VoteType::NotYetVoted; voter_list.len()];
        Self {
            ballot_identifier: ballot_identifier.into(),
            voter_list,
            votes,
            observation_type,
            ballot_threshold,
            ballot_status: BallotStatus::InProgress,
            ballot_creation_height,
        }
    }

    pub fn voter_list(&self) -> &[Address] {
        &self.voter_list
    }

    pub fn votes(&self) -> &[VoteType] {
        &self.votes
    }

    pub fn status(&self) -> BallotStatus {
        self.ballot_status
    }

    /// Slot index of `voter`, by linear search over the voter list.
    pub fn voter_index(&self, voter: &Address) -> Option<usize> {
        self.voter_list.iter().position(|v| v == voter)
    }

    /// The vote recorded for `voter`, `None` if the voter is not in the list.
    pub fn vote_of(&self, voter: &Address) -> Option<VoteType> {
        self.voter_index(voter).map(|i| self.votes[i])
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        matches!(
            self.vote_of(voter),
            Some(VoteType::SuccessObservation | VoteType::FailureObservation)
        )
    }

    /// Record `vote` in the voter's slot.
    ///
    /// Rejected without touching the ballot when the ballot is finalized, the
    /// voter is not in the voter list, or the voter already voted.
    pub fn add_vote(&mut self, voter: &Address, vote: VoteType) -> Result<(), ObserverError> {
        if vote == VoteType::NotYetVoted {
            return Err(ObserverError::InvalidVote);
        }
        if self.ballot_status.is_finalized() {
            return Err(ObserverError::BallotFinalized(self.ballot_identifier.clone()));
        }
        let index = self
            .voter_index(voter)
            .ok_or_else(|| ObserverError::VoterNotInList {
                voter: voter.clone(),
                ballot: self.ballot_identifier.clone(),
            })?;
        if self.votes[index] != VoteType::NotYetVoted {
            return Err(ObserverError::AlreadyVoted {
                voter: voter.clone(),
                ballot: self.ballot_identifier.clone(),
            });
        }
        self.votes[index] = vote;
        Ok(())
    }

    pub fn success_count(&self) -> u64 {
        self.count(VoteType::SuccessObservation)
    }

    pub fn failure_count(&self) -> u64 {
        self.count(VoteType::FailureObservation)
    }

    fn count(&self, kind: VoteType) -> u64 {
        self.votes.iter().filter(|v| **v == kind).count() as u64
    }

    /// Finalize the ballot if either outcome has reached the threshold.
    ///
    /// Returns `true` only on the call that moves the ballot out of
    /// `InProgress`. An empty voter list never finalizes.
    pub fn try_finalize(&mut self) -> bool {
        if self.ballot_status.is_finalized() {
            return false;
        }
        let total = self.voter_list.len() as u64;

        if self.ballot_threshold.is_met_by(self.failure_count(), total) {
            self.ballot_status = BallotStatus::FinalizedFailureObservation;
            return true;
        }
        if self.ballot_threshold.is_met_by(self.success_count(), total) {
            self.ballot_status = BallotStatus::FinalizedSuccessObservation;
            return true;
        }
        false
    }

    /// Add this ballot's reward units to `rewards`, returning the units it
    /// contributes to the total.
    ///
    /// Voters whose vote matches the finalized outcome gain one unit, every
    /// other voter (including abstainers) loses one. Only matching votes count
    /// toward the returned total. In-progress ballots contribute nothing.
    pub fn build_rewards_distribution(&self, rewards: &mut BTreeMap<Address, i64>) -> i64 {
        let winning = match self.ballot_status {
            BallotStatus::FinalizedSuccessObservation => VoteType::SuccessObservation,
            BallotStatus::FinalizedFailureObservation => VoteType::FailureObservation,
            BallotStatus::InProgress => return 0,
        };

        let mut total = 0;
        for (voter, vote) in self.voter_list.iter().zip(&self.votes) {
            let entry = rewards.entry(voter.clone()).or_insert(0);
            if *vote == winning {
                *entry += 1;
                total += 1;
            } else {
                *entry -= 1;
            }
        }
        total
    }

    /// Structural checks for ballots loaded from outside the vote path.
    pub fn validate(&self) -> Result<(), ObserverError> {
        let invalid = |reason: &str| ObserverError::InvalidBallot {
            ballot: self.ballot_identifier.clone(),
            reason: reason.to_string(),
        };
        if self.ballot_identifier.is_empty() {
            return Err(invalid("empty identifier"));
        }
        if self.votes.len() != self.voter_list.len() {
            return Err(invalid("votes and voter list differ in length"));
        }
        let unique: BTreeSet<&Address> = self.voter_list.iter().collect();
        if unique.len() != self.voter_list.len() {
            return Err(invalid("duplicate voter"));
        }
        if let Some(bad) = self.voter_list.iter().find(|v| !v.is_valid()) {
            return Err(invalid(&format!("malformed voter address {bad}")));
        }
        if !self.ballot_threshold.is_fraction() {
            return Err(invalid("threshold above 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xchain_nullables::sample;

    fn threshold(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn ballot(voters: usize, t: &str) -> (Ballot, Vec<Address>) {
        let addrs = sample::addresses(voters);
        let b = Ballot::new(
            "test-ballot",
            addrs.clone(),
            ObservationType::InboundTx,
            threshold(t),
            10,
        );
        (b, addrs)
    }

    #[test]
    fn new_ballot_has_one_unvoted_slot_per_voter() {
        let (b, addrs) = ballot(4, "0.66");
        assert_eq!(b.votes().len(), addrs.len());
        assert!(b.votes().iter().all(|v| *v == VoteType::NotYetVoted));
        assert_eq!(b.status(), BallotStatus::InProgress);
        assert!(b.validate().is_ok());
    }

    #[test]
    fn add_vote_writes_voter_slot() {
        let (mut b, addrs) = ballot(3, "0.66");
        b.add_vote(&addrs[1], VoteType::FailureObservation).unwrap();
        assert_eq!(b.votes()[1], VoteType::FailureObservation);
        assert_eq!(b.votes()[0], VoteType::NotYetVoted);
        assert!(b.has_voted(&addrs[1]));
        assert!(!b.has_voted(&addrs[0]));
    }

    #[test]
    fn double_vote_is_rejected_and_ballot_untouched() {
        let (mut b, addrs) = ballot(3, "0.66");
        b.add_vote(&addrs[0], VoteType::SuccessObservation).unwrap();
        let before = b.clone();
        let err = b.add_vote(&addrs[0], VoteType::FailureObservation).unwrap_err();
        assert!(matches!(err, ObserverError::AlreadyVoted { .. }));
        assert_eq!(b, before);
    }

    #[test]
    fn unknown_voter_is_rejected() {
        let (mut b, _) = ballot(3, "0.66");
        let outsider = sample::address(999);
        let err = b.add_vote(&outsider, VoteType::SuccessObservation).unwrap_err();
        assert!(matches!(err, ObserverError::VoterNotInList { .. }));
        assert!(!b.has_voted(&outsider));
    }

    #[test]
    fn not_yet_voted_is_not_a_vote() {
        let (mut b, addrs) = ballot(2, "0.5");
        assert!(matches!(
            b.add_vote(&addrs[0], VoteType::NotYetVoted),
            Err(ObserverError::InvalidVote)
        ));
    }

    #[test]
    fn three_of_four_at_066_finalizes_success() {
        let (mut b, addrs) = ballot(4, "0.66");
        for a in &addrs[..3] {
            b.add_vote(a, VoteType::SuccessObservation).unwrap();
        }
        assert!(b.try_finalize());
        assert_eq!(b.status(), BallotStatus::FinalizedSuccessObservation);
    }

    #[test]
    fn two_of_four_at_full_threshold_stays_in_progress() {
        let (mut b, addrs) = ballot(4, "1.00");
        for a in &addrs[..2] {
            b.add_vote(a, VoteType::SuccessObservation).unwrap();
        }
        assert!(!b.try_finalize());
        assert_eq!(b.status(), BallotStatus::InProgress);
    }

    #[test]
    fn failure_is_checked_first() {
        let (mut b, addrs) = ballot(2, "0.5");
        b.add_vote(&addrs[0], VoteType::SuccessObservation).unwrap();
        b.add_vote(&addrs[1], VoteType::FailureObservation).unwrap();
        assert!(b.try_finalize());
        assert_eq!(b.status(), BallotStatus::FinalizedFailureObservation);
    }

    #[test]
    fn finalize_reports_transition_once() {
        let (mut b, addrs) = ballot(2, "0.5");
        b.add_vote(&addrs[0], VoteType::SuccessObservation).unwrap();
        assert!(b.try_finalize());
        assert!(!b.try_finalize());
        assert_eq!(b.status(), BallotStatus::FinalizedSuccessObservation);
    }

    #[test]
    fn finalized_ballot_rejects_votes() {
        let (mut b, addrs) = ballot(2, "0.5");
        b.add_vote(&addrs[0], VoteType::SuccessObservation).unwrap();
        b.try_finalize();
        let before = b.clone();
        assert!(matches!(
            b.add_vote(&addrs[1], VoteType::FailureObservation),
            Err(ObserverError::BallotFinalized(_))
        ));
        assert_eq!(b, before);
    }

    #[test]
    fn empty_voter_list_never_finalizes() {
        let mut b = Ballot::new("empty", Vec::new(), ObservationType::InboundTx, Decimal::ZERO, 1);
        assert!(!b.try_finalize());
        assert_eq!(b.status(), BallotStatus::InProgress);
    }

    #[test]
    fn rewards_match_outcome() {
        let (mut b, addrs) = ballot(4, "0.66");
        for a in &addrs[..3] {
            b.add_vote(a, VoteType::SuccessObservation).unwrap();
        }
        b.try_finalize();

        let mut rewards = BTreeMap::new();
        let total = b.build_rewards_distribution(&mut rewards);
        assert_eq!(total, 3);
        assert_eq!(rewards[&addrs[0]], 1);
        assert_eq!(rewards[&addrs[3]], -1);
        assert_eq!(rewards.values().sum::<i64>(), 3 - 1);
    }

    #[test]
    fn rewards_accumulate_across_ballots() {
        let (mut b, addrs) = ballot(2, "0.5");
        b.add_vote(&addrs[0], VoteType::FailureObservation).unwrap();
        b.try_finalize();

        let mut rewards = BTreeMap::new();
        rewards.insert(addrs[0].clone(), 5);
        let total = b.build_rewards_distribution(&mut rewards);
        assert_eq!(total, 1);
        assert_eq!(rewards[&addrs[0]], 6);
        assert_eq!(rewards[&addrs[1]], -1);
    }

    #[test]
    fn in_progress_ballot_contributes_nothing() {
        let (mut b, addrs) = ballot(4, "0.66");
        b.add_vote(&addrs[0], VoteType::SuccessObservation).unwrap();
        let mut rewards = BTreeMap::new();
        assert_eq!(b.build_rewards_distribution(&mut rewards), 0);
        assert!(rewards.is_empty());
    }

    #[test]
    fn validate_catches_duplicates_and_bad_threshold() {
        let a = sample::address(1);
        let voters = vec![a.clone(), a];
        let dup = Ballot::new("dup", voters, ObservationType::OutboundTx, Decimal::ONE, 1);
        assert!(dup.validate().is_err());

        let (mut b, _) = ballot(2, "0.5");
        b.ballot_threshold = threshold("1.5");
        assert!(b.validate().is_err());
    }
}
