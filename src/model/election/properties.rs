//! Randomised operation sequences checked against the election's invariants.

use std::collections::HashSet;

use chrono::Duration;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use super::*;
use crate::clock::ManualClock;
use crate::error::ErrorKind;

const SEEDS: u64 = 64;
const STEPS: usize = 200;

/// Owner, a handful of would-be candidates, and plenty of voters.
fn participants() -> Vec<ParticipantId> {
    let mut participants = vec![
        ParticipantId::owner_example(),
        ParticipantId::candidate_example1(),
        ParticipantId::candidate_example2(),
        ParticipantId::candidate_example3(),
    ];
    participants.extend((1..=12).map(ParticipantId::voter_example));
    participants
}

fn random_operation(rng: &mut StdRng, participants: &[ParticipantId]) -> Operation {
    match rng.gen_range(0..10) {
        0 | 1 => Operation::ApplyAsCandidate,
        2 => Operation::CancelCandidacy,
        3 => Operation::StartElection {
            duration: rng.gen_range(600..2100),
        },
        4 => Operation::EndElection,
        5 => Operation::CancelElection,
        _ => Operation::Vote {
            candidate: participants.choose(rng).unwrap().clone(),
        },
    }
}

/// Everything observable about the election that the invariants talk about.
struct Snapshot {
    phase: ElectionPhase,
    voted: HashSet<ParticipantId>,
    tallies: Vec<(ParticipantId, VoteCount)>,
}

impl Snapshot {
    fn take(election: &Election<ManualClock>, participants: &[ParticipantId]) -> Self {
        Self {
            phase: election.phase(),
            voted: participants
                .iter()
                .filter(|id| election.has_voted(id))
                .cloned()
                .collect(),
            tallies: participants
                .iter()
                .map(|id| (id.clone(), election.candidate_votes(id)))
                .collect(),
        }
    }
}

fn run_sequence(seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let participants = participants();
    let owner = ParticipantId::owner_example();
    let clock = ManualClock::example();
    let mut election = Election::example(clock.clone());
    let mut successful_voters = HashSet::new();

    for _ in 0..STEPS {
        if rng.gen_bool(0.1) {
            clock.advance(Duration::seconds(rng.gen_range(0..600)));
        }

        let caller = participants.choose(&mut rng).unwrap().clone();
        let operation = random_operation(&mut rng, &participants);
        let before = Snapshot::take(&election, &participants);
        let started_with = election.candidates().count();

        let result = election.execute(&caller, operation.clone());
        let after = Snapshot::take(&election, &participants);

        // The phase only moves forward.
        assert!(after.phase >= before.phase, "seed {seed}: phase went backwards");
        // Nobody forgets that they voted.
        assert!(after.voted.is_superset(&before.voted), "seed {seed}: vote forgotten");
        // The owner never stands or votes.
        assert!(!election.is_candidate(&owner), "seed {seed}: owner is a candidate");
        assert!(!election.has_voted(&owner), "seed {seed}: owner voted");

        match (&operation, &result) {
            (Operation::Vote { .. }, Ok(())) => {
                assert!(successful_voters.insert(caller.clone()), "seed {seed}: double vote");
                assert!(!election.is_candidate(&caller), "seed {seed}: candidate voted");
            }
            (Operation::Vote { .. }, Err(_)) if caller == owner => {
                assert_eq!(result.as_ref().unwrap_err().kind(), ErrorKind::Role);
            }
            (Operation::StartElection { .. }, Err(err)) if started_with == 0 && caller == owner => {
                if before.phase == ElectionPhase::NotStarted {
                    assert_eq!(err.kind(), ErrorKind::Precondition);
                }
            }
            (Operation::CancelElection, result) => assert!(result.is_err()),
            _ => {}
        }

        // Refused operations change nothing.
        if result.is_err() {
            assert!(after.phase == before.phase, "seed {seed}: refused op changed phase");
            assert_eq!(after.voted, before.voted, "seed {seed}: refused op changed voters");
            assert_eq!(after.tallies, before.tallies, "seed {seed}: refused op changed tallies");
        }

        // Tallies only grow, and only while voting is open.
        for ((id, old), (_, new)) in before.tallies.iter().zip(&after.tallies) {
            assert!(new >= old, "seed {seed}: tally for {id} shrank");
            if new > old {
                assert_eq!(after.phase, ElectionPhase::Started);
            }
        }

        // Every counted vote belongs to exactly one distinct voter.
        assert_eq!(
            election.total_votes(),
            successful_voters.len() as VoteCount,
            "seed {seed}: tally does not match turnout"
        );
    }
}

#[test]
fn invariants_hold_for_random_sequences() {
    log4rs_test_utils::test_logging::init_logging_once_for(["election_engine"], None, None);

    for seed in 0..SEEDS {
        run_sequence(seed);
    }
}
