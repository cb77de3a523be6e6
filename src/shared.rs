use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::model::{
    Election, ElectionPhase, ElectionResults, Operation, ParticipantId, VoteCount,
};

/// An election shared between threads.
///
/// Operations are serialised behind a write lock, so each one sees every
/// earlier operation fully applied. Reads share a read lock and never mutate.
#[derive(Debug)]
pub struct SharedElection<C = SystemClock> {
    inner: Arc<RwLock<Election<C>>>,
}

impl<C> Clone for SharedElection<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Clock> SharedElection<C> {
    pub fn new(election: Election<C>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(election)),
        }
    }

    /// Perform a state-changing operation on behalf of `caller`.
    pub fn execute(&self, caller: &ParticipantId, operation: Operation) -> Result<()> {
        self.write().execute(caller, operation)
    }

    pub fn apply_as_candidate(&self, caller: &ParticipantId) -> Result<()> {
        self.write().apply_as_candidate(caller)
    }

    pub fn cancel_candidacy(&self, caller: &ParticipantId) -> Result<()> {
        self.write().cancel_candidacy(caller)
    }

    pub fn start_election(&self, caller: &ParticipantId, duration: u32) -> Result<()> {
        self.write().start_election(caller, duration)
    }

    pub fn end_election(&self, caller: &ParticipantId) -> Result<()> {
        self.write().end_election(caller)
    }

    pub fn cancel_election(&self, caller: &ParticipantId) -> Result<()> {
        self.write().cancel_election(caller)
    }

    pub fn vote(&self, caller: &ParticipantId, candidate: &ParticipantId) -> Result<()> {
        self.write().vote(caller, candidate)
    }
}

impl<C> SharedElection<C> {
    pub fn phase(&self) -> ElectionPhase {
        self.read().phase()
    }

    pub fn is_candidate(&self, id: &ParticipantId) -> bool {
        self.read().is_candidate(id)
    }

    pub fn candidate_votes(&self, id: &ParticipantId) -> VoteCount {
        self.read().candidate_votes(id)
    }

    pub fn has_voted(&self, id: &ParticipantId) -> bool {
        self.read().has_voted(id)
    }

    pub fn total_votes(&self) -> VoteCount {
        self.read().total_votes()
    }

    /// The leading candidate, owned so that no lock outlives the call.
    pub fn winner(&self) -> Result<ParticipantId> {
        self.read().winner().map(Clone::clone)
    }

    pub fn results(&self) -> ElectionResults {
        self.read().results()
    }

    /// Run `f` against a consistent view of the election.
    pub fn inspect<T>(&self, f: impl FnOnce(&Election<C>) -> T) -> T {
        f(&self.read())
    }

    // Operations validate before they commit, so a panic cannot leave the
    // election half-updated and a poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Election<C>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Election<C>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use chrono::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ErrorKind;

    #[election_test(started)]
    fn concurrent_voters_are_each_counted_once(election: Election<ManualClock>, clock: ManualClock) {
        let shared = SharedElection::new(election);
        let alice = ParticipantId::candidate_example1();
        let bob = ParticipantId::candidate_example2();

        let handles: Vec<_> = (0..8)
            .map(|thread_index| {
                let shared = shared.clone();
                let (alice, bob) = (alice.clone(), bob.clone());
                thread::spawn(move || {
                    let mut refused = 0;
                    // Every thread tries every voter, so most attempts are double votes.
                    for n in 0..50 {
                        let candidate = if (n + thread_index) % 2 == 0 { &alice } else { &bob };
                        if let Err(err) = shared.vote(&ParticipantId::voter_example(n), candidate) {
                            assert_eq!(err.kind(), ErrorKind::Conflict);
                            refused += 1;
                        }
                    }
                    refused
                })
            })
            .collect();
        let refused: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(refused, 7 * 50);
        assert_eq!(shared.total_votes(), 50);
        assert_eq!(
            shared.candidate_votes(&alice) + shared.candidate_votes(&bob),
            50
        );
        assert!(shared.has_voted(&ParticipantId::voter_example(49)));

        clock.advance(Duration::minutes(20));
        shared.end_election(&ParticipantId::owner_example()).unwrap();
        assert_eq!(shared.phase(), ElectionPhase::Ended);
        assert_eq!(shared.results().total_votes, 50);
        assert!(shared.winner().is_ok());
    }

    #[election_test]
    fn clones_share_one_election(election: Election<ManualClock>) {
        let shared = SharedElection::new(election);
        let other = shared.clone();

        other
            .apply_as_candidate(&ParticipantId::candidate_example1())
            .unwrap();

        assert!(shared.is_candidate(&ParticipantId::candidate_example1()));
        assert_eq!(shared.inspect(|election| election.candidates().count()), 1);
        assert!(shared.cancel_election(&ParticipantId::owner_example()).is_err());
    }
}
