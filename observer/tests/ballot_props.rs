use proptest::prelude::*;

use xchain_nullables::sample;
use xchain_observer::{Ballot, BallotStatus, ObservationType, VoteType};
use xchain_types::{Address, Decimal};

fn vote_kind() -> impl Strategy<Value = VoteType> {
    prop_oneof![
        Just(VoteType::SuccessObservation),
        Just(VoteType::FailureObservation),
    ]
}

/// A ballot plus a sequence of (voter index, vote) attempts, some repeating
/// voters and some naming voters outside the list.
fn scenario() -> impl Strategy<Value = (usize, u64, Vec<(usize, VoteType)>)> {
    (1usize..8, 0u64..=100).prop_flat_map(|(n, pct)| {
        (
            Just(n),
            Just(pct),
            prop::collection::vec((0..n + 2, vote_kind()), 0..24),
        )
    })
}

fn ballot(n: usize, pct: u64) -> (Ballot, Vec<Address>) {
    let voters = sample::addresses(n);
    let threshold = Decimal::from_ratio(pct, 100).expect("ratio");
    let b = Ballot::new("prop", voters.clone(), ObservationType::InboundTx, threshold, 1);
    (b, voters)
}

proptest! {
    /// Votes and voter list stay the same length whatever is attempted.
    #[test]
    fn votes_match_voter_list((n, pct, attempts) in scenario()) {
        let (mut b, voters) = ballot(n, pct);
        for (i, kind) in attempts {
            let voter = voters.get(i).cloned().unwrap_or_else(|| sample::address(1_000 + i as u64));
            let _ = b.add_vote(&voter, kind);
            b.try_finalize();
            prop_assert_eq!(b.votes().len(), b.voter_list().len());
        }
    }

    /// A voter's second vote always fails and leaves the ballot unchanged.
    #[test]
    fn second_vote_rejected(n in 1usize..8, first in vote_kind(), second in vote_kind()) {
        let voters = sample::addresses(n);
        let kind = ObservationType::InboundTx;
        let mut b = Ballot::new("prop", voters.clone(), kind, Decimal::ONE, 1);
        b.add_vote(&voters[0], first).unwrap();
        let before = b.clone();
        prop_assert!(b.add_vote(&voters[0], second).is_err());
        prop_assert_eq!(b, before);
    }

    /// Once finalized, neither status nor slots change.
    #[test]
    fn finalized_is_terminal((n, pct, attempts) in scenario()) {
        let (mut b, voters) = ballot(n, pct);
        let mut frozen: Option<Ballot> = None;
        for (i, kind) in attempts {
            let voter = voters.get(i).cloned().unwrap_or_else(|| sample::address(1_000 + i as u64));
            let _ = b.add_vote(&voter, kind);
            let transitioned = b.try_finalize();
            if let Some(f) = &frozen {
                prop_assert!(!transitioned);
                prop_assert_eq!(&b, f);
            } else if b.status().is_finalized() {
                prop_assert!(transitioned);
                frozen = Some(b.clone());
            } else {
                prop_assert_eq!(b.status(), BallotStatus::InProgress);
            }
        }
    }

    /// For a success ballot, accruals sum to matching minus non-matching and
    /// the total counts matching votes.
    #[test]
    fn rewards_accrual_sums(n in 1usize..10, yes_seed in 0usize..100, no_seed in 0usize..100) {
        let voters = sample::addresses(n);
        let yes = 1 + yes_seed % n;
        let no = (no_seed % (n - yes + 1)).min(yes - 1);
        // Exactly reachable by the success votes, out of reach for the failures.
        let threshold = Decimal::from_ratio(yes as u64, n as u64).expect("ratio");
        let mut b = Ballot::new("prop", voters.clone(), ObservationType::InboundTx, threshold, 1);
        for v in &voters[..yes] {
            b.add_vote(v, VoteType::SuccessObservation).unwrap();
        }
        for v in &voters[yes..yes + no] {
            b.add_vote(v, VoteType::FailureObservation).unwrap();
        }
        prop_assert!(b.try_finalize());
        prop_assert_eq!(b.status(), BallotStatus::FinalizedSuccessObservation);

        let mut rewards = std::collections::BTreeMap::new();
        let total = b.build_rewards_distribution(&mut rewards);
        let sum: i64 = rewards.values().sum();
        prop_assert_eq!(total, yes as i64);
        prop_assert_eq!(sum, yes as i64 - (n - yes) as i64);
    }
}
