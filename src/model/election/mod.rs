//! The election state machine.
//!
//! Every state-changing operation funnels through [`Election::execute`], which
//! logs it and dispatches on the current stage. Each operation validates all of
//! its guards before touching any state, so a refused operation has no effect.

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{
    ConflictError, PhaseError, PreconditionError, Result, RoleError, ValidationError,
};
use crate::logging::{log_request, log_response};

use super::results::resolve_winner;
use super::{
    CandidateRoster, ElectionPhase, ElectionResults, Operation, ParticipantId, VoteCount,
    VoterLedger, VotingWindow,
};

#[cfg(test)]
mod properties;

/// Where the election is in its lifecycle, with the data each stage carries.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Stage {
    NotStarted,
    Started(VotingWindow),
    Ended(VotingWindow),
}

impl Stage {
    fn phase(&self) -> ElectionPhase {
        match self {
            Self::NotStarted => ElectionPhase::NotStarted,
            Self::Started(_) => ElectionPhase::Started,
            Self::Ended(_) => ElectionPhase::Ended,
        }
    }
}

/// A single owner-controlled election.
#[derive(Debug, Clone)]
pub struct Election<C = SystemClock> {
    /// Fixed at construction.
    owner: ParticipantId,
    stage: Stage,
    candidates: CandidateRoster,
    voters: VoterLedger,
    config: Config,
    clock: C,
}

impl<C: Clock> Election<C> {
    /// Create an election owned by `owner` with the default configuration.
    pub fn new(owner: ParticipantId, clock: C) -> Self {
        Self::with_config(owner, Config::default(), clock)
    }

    /// Create an election owned by `owner`.
    pub fn with_config(owner: ParticipantId, config: Config, clock: C) -> Self {
        info!("Created election owned by {owner}");
        Self {
            owner,
            stage: Stage::NotStarted,
            candidates: CandidateRoster::new(),
            voters: VoterLedger::new(),
            config,
            clock,
        }
    }

    /// Perform a state-changing operation on behalf of `caller`.
    pub fn execute(&mut self, caller: &ParticipantId, operation: Operation) -> Result<()> {
        let id = log_request(caller, &operation);
        let result = if operation.is_owner_only() && *caller != self.owner {
            Err(RoleError::NotOwner.into())
        } else {
            self.dispatch(caller, operation)
        };
        log_response(id, &result);
        result
    }

    fn dispatch(&mut self, caller: &ParticipantId, operation: Operation) -> Result<()> {
        match operation {
            Operation::ApplyAsCandidate => self.register_candidate(caller),
            Operation::CancelCandidacy => self.withdraw_candidate(caller),
            Operation::StartElection { duration } => self.open_voting(duration),
            Operation::EndElection => self.close_voting(),
            Operation::CancelElection => self.refuse_cancellation(),
            Operation::Vote { candidate } => self.cast_vote(caller, &candidate),
        }
    }

    /// Stand as a candidate. Only possible before the election starts.
    pub fn apply_as_candidate(&mut self, caller: &ParticipantId) -> Result<()> {
        self.execute(caller, Operation::ApplyAsCandidate)
    }

    /// Withdraw a candidacy. Only possible before the election starts.
    pub fn cancel_candidacy(&mut self, caller: &ParticipantId) -> Result<()> {
        self.execute(caller, Operation::CancelCandidacy)
    }

    /// Open voting for `duration` seconds, starting now.
    pub fn start_election(&mut self, caller: &ParticipantId, duration: u32) -> Result<()> {
        self.execute(caller, Operation::StartElection { duration })
    }

    /// Close voting. The voting window must have elapsed.
    pub fn end_election(&mut self, caller: &ParticipantId) -> Result<()> {
        self.execute(caller, Operation::EndElection)
    }

    /// Always refused; the error depends on whether voting is open.
    pub fn cancel_election(&mut self, caller: &ParticipantId) -> Result<()> {
        self.execute(caller, Operation::CancelElection)
    }

    /// Cast `caller`'s single vote for `candidate`.
    pub fn vote(&mut self, caller: &ParticipantId, candidate: &ParticipantId) -> Result<()> {
        self.execute(
            caller,
            Operation::Vote {
                candidate: candidate.clone(),
            },
        )
    }

    fn register_candidate(&mut self, caller: &ParticipantId) -> Result<()> {
        match self.stage {
            Stage::NotStarted => {}
            Stage::Started(_) | Stage::Ended(_) => return Err(PhaseError::AfterStart.into()),
        }
        if *caller == self.owner {
            return Err(RoleError::OwnerCannotBeCandidate.into());
        }

        if self.candidates.register(caller) {
            info!("{caller} registered as a candidate");
        } else {
            debug!("{caller} is already a candidate");
        }
        Ok(())
    }

    fn withdraw_candidate(&mut self, caller: &ParticipantId) -> Result<()> {
        match self.stage {
            Stage::NotStarted => {}
            Stage::Started(_) | Stage::Ended(_) => return Err(PhaseError::AfterStart.into()),
        }
        if !self.candidates.withdraw(caller) {
            return Err(RoleError::NotCandidate.into());
        }

        info!("{caller} withdrew their candidacy");
        Ok(())
    }

    // Owner-only handlers rely on `execute` having checked the caller.
    fn open_voting(&mut self, duration: u32) -> Result<()> {
        match self.stage {
            Stage::NotStarted => {}
            Stage::Started(_) | Stage::Ended(_) => return Err(PhaseError::AfterStart.into()),
        }
        if self.candidates.registered_count() == 0 {
            return Err(PreconditionError::NoCandidatesAvailable.into());
        }
        if !self.config.duration_window().contains(&duration) {
            return Err(PreconditionError::DurationOutOfRange.into());
        }

        let window = VotingWindow::checked_new(self.clock.now(), duration)
            .ok_or(PreconditionError::WindowOutOfRange)?;
        self.stage = Stage::Started(window);
        info!(
            "Election started with {} candidates, voting closes at {}",
            self.candidates.registered_count(),
            window.end_time()
        );
        Ok(())
    }

    fn close_voting(&mut self) -> Result<()> {
        let window = match self.stage {
            Stage::Started(window) => window,
            Stage::NotStarted => return Err(PhaseError::NotStarted.into()),
            Stage::Ended(_) => return Err(PhaseError::AlreadyEnded.into()),
        };
        if !window.has_elapsed(self.clock.now()) {
            return Err(PreconditionError::ElectionInProgress.into());
        }

        self.stage = Stage::Ended(window);
        info!("Election ended with {} votes cast", self.voters.turnout());
        Ok(())
    }

    fn refuse_cancellation(&self) -> Result<()> {
        match self.stage {
            Stage::Started(_) => Err(PhaseError::AfterStart.into()),
            Stage::NotStarted | Stage::Ended(_) => Err(PhaseError::AlreadyStarted.into()),
        }
    }

    fn cast_vote(&mut self, caller: &ParticipantId, candidate: &ParticipantId) -> Result<()> {
        if *caller == self.owner {
            return Err(RoleError::OwnerCannotVote.into());
        }
        match self.stage {
            Stage::Started(window) if window.contains(self.clock.now()) => {}
            _ => return Err(PhaseError::OutsideElectionPeriod.into()),
        }
        if self.candidates.is_registered(caller) {
            return Err(RoleError::CandidateCannotVote.into());
        }
        if !self.candidates.is_registered(candidate) {
            return Err(ValidationError::InvalidCandidate.into());
        }
        if self.voters.has_voted(caller) {
            return Err(ConflictError::AlreadyVoted.into());
        }

        // Both halves of the vote land together; neither can fail after the checks above.
        let recorded = self.candidates.record_vote(candidate);
        debug_assert!(recorded);
        self.voters.mark_voted(caller);
        debug!("{caller} voted for {candidate}");
        Ok(())
    }
}

impl<C> Election<C> {
    /// The participant who controls the election.
    pub fn owner(&self) -> &ParticipantId {
        &self.owner
    }

    pub fn phase(&self) -> ElectionPhase {
        self.stage.phase()
    }

    /// The phase as its ordinal status code: 0 not started, 1 started, 2 ended.
    pub fn election_status(&self) -> u8 {
        self.phase().ordinal()
    }

    /// The voting window, once the election has started.
    pub fn voting_window(&self) -> Option<VotingWindow> {
        match self.stage {
            Stage::NotStarted => None,
            Stage::Started(window) | Stage::Ended(window) => Some(window),
        }
    }

    pub fn is_candidate(&self, id: &ParticipantId) -> bool {
        self.candidates.is_registered(id)
    }

    /// Votes received by `id`; zero for anyone who never stood.
    pub fn candidate_votes(&self, id: &ParticipantId) -> VoteCount {
        self.candidates.votes(id)
    }

    /// Registered candidates in registration order.
    pub fn candidates(&self) -> impl Iterator<Item = &ParticipantId> {
        self.candidates.registered().map(|(id, _)| id)
    }

    pub fn has_voted(&self, id: &ParticipantId) -> bool {
        self.voters.has_voted(id)
    }

    /// Total votes cast so far.
    pub fn total_votes(&self) -> VoteCount {
        self.candidates
            .registered()
            .map(|(_, candidate)| candidate.vote_count)
            .sum()
    }

    /// The leading candidate; final once the election has ended.
    pub fn winner(&self) -> Result<&ParticipantId> {
        self.winner_with_votes().map(|(id, _)| id)
    }

    /// The leading candidate together with its tally.
    pub fn winner_with_votes(&self) -> Result<(&ParticipantId, VoteCount)> {
        resolve_winner(&self.candidates)
    }

    /// A snapshot of every tally and the current leader.
    pub fn results(&self) -> ElectionResults {
        ElectionResults::from_roster(self.phase(), &self.candidates)
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use chrono::Duration;

    use super::*;
    use crate::clock::ManualClock;

    impl Election<ManualClock> {
        /// A fresh election owned by the example owner.
        pub fn example(clock: ManualClock) -> Self {
            Self::new(ParticipantId::owner_example(), clock)
        }

        /// Two candidates registered, in the order alice, bob.
        pub fn registered_example(clock: ManualClock) -> Self {
            let mut election = Self::example(clock);
            election
                .apply_as_candidate(&ParticipantId::candidate_example1())
                .unwrap();
            election
                .apply_as_candidate(&ParticipantId::candidate_example2())
                .unwrap();
            election
        }

        /// Voting open for twenty minutes from the clock's current instant.
        pub fn started_example(clock: ManualClock) -> Self {
            let mut election = Self::registered_example(clock);
            election
                .start_election(&ParticipantId::owner_example(), 20 * 60)
                .unwrap();
            election
        }

        /// Closed after alice received two votes and bob one.
        /// The clock is left just past the end of voting.
        pub fn ended_example(clock: ManualClock) -> Self {
            let mut election = Self::started_example(clock.clone());
            let alice = ParticipantId::candidate_example1();
            let bob = ParticipantId::candidate_example2();
            election.vote(&ParticipantId::voter_example(1), &alice).unwrap();
            election.vote(&ParticipantId::voter_example(2), &alice).unwrap();
            election.vote(&ParticipantId::voter_example(3), &bob).unwrap();
            clock.advance(Duration::seconds(20 * 60 + 1));
            election.end_election(&ParticipantId::owner_example()).unwrap();
            election
        }
    }
}
