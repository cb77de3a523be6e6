use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{ParticipantId, VoteCount};

/// A single candidate's registration and tally.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Currently standing? Cleared when the candidacy is withdrawn.
    pub registered: bool,
    /// Votes received so far.
    pub vote_count: VoteCount,
}

/// All candidates, in order of first registration.
///
/// A withdrawn candidate keeps its slot, so a later re-application lands back
/// in its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRoster {
    order: Vec<ParticipantId>,
    candidates: HashMap<ParticipantId, Candidate>,
}

impl CandidateRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id`, reusing its slot if it stood before.
    /// Returns false if it was already registered.
    pub fn register(&mut self, id: &ParticipantId) -> bool {
        match self.candidates.get_mut(id) {
            Some(candidate) if candidate.registered => false,
            Some(candidate) => {
                candidate.registered = true;
                true
            }
            None => {
                self.order.push(id.clone());
                self.candidates.insert(
                    id.clone(),
                    Candidate {
                        registered: true,
                        vote_count: 0,
                    },
                );
                true
            }
        }
    }

    /// Withdraw `id`. Returns false if it was not registered.
    pub fn withdraw(&mut self, id: &ParticipantId) -> bool {
        match self.candidates.get_mut(id) {
            Some(candidate) if candidate.registered => {
                candidate.registered = false;
                true
            }
            _ => false,
        }
    }

    pub fn is_registered(&self, id: &ParticipantId) -> bool {
        self.candidates
            .get(id)
            .map(|candidate| candidate.registered)
            .unwrap_or(false)
    }

    /// The stored tally for `id`, or zero if it never stood.
    pub fn votes(&self, id: &ParticipantId) -> VoteCount {
        self.candidates
            .get(id)
            .map(|candidate| candidate.vote_count)
            .unwrap_or(0)
    }

    /// Add one vote for a registered candidate.
    /// Returns false, changing nothing, if `id` is not registered.
    pub fn record_vote(&mut self, id: &ParticipantId) -> bool {
        match self.candidates.get_mut(id) {
            Some(candidate) if candidate.registered => {
                candidate.vote_count += 1;
                true
            }
            _ => false,
        }
    }

    /// Registered candidates in registration order.
    pub fn registered(&self) -> impl Iterator<Item = (&ParticipantId, &Candidate)> {
        self.order.iter().filter_map(|id| {
            self.candidates
                .get(id)
                .filter(|candidate| candidate.registered)
                .map(|candidate| (id, candidate))
        })
    }

    pub fn registered_count(&self) -> usize {
        self.registered().count()
    }
}
