use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{PreconditionError, Result};

use super::{CandidateRoster, ElectionPhase, ParticipantId, VoteCount};

/// Find the leading candidate.
///
/// Candidates are scanned in registration order and a later candidate only
/// takes the lead with strictly more votes, so ties go to whoever registered
/// first.
pub fn resolve_winner(roster: &CandidateRoster) -> Result<(&ParticipantId, VoteCount)> {
    let mut leader: Option<(&ParticipantId, VoteCount)> = None;
    for (id, candidate) in roster.registered() {
        let takes_lead = match leader {
            Some((_, best)) => candidate.vote_count > best,
            None => true,
        };
        if takes_lead {
            leader = Some((id, candidate.vote_count));
        }
    }
    leader.ok_or_else(|| PreconditionError::NoCandidates.into())
}

/// The tally for a single candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTally {
    pub candidate: ParticipantId,
    pub votes: VoteCount,
}

impl Display for CandidateTally {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} vote{}",
            self.candidate,
            self.votes,
            if self.votes != 1 { "s" } else { "" }
        )
    }
}

/// A snapshot of the whole election outcome. All of it is public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResults {
    /// Phase at the time of the snapshot.
    pub phase: ElectionPhase,
    /// Registered candidates in registration order.
    pub tallies: Vec<CandidateTally>,
    /// Sum of all tallies.
    pub total_votes: VoteCount,
    /// The current leader, if anyone is standing.
    pub winner: Option<ParticipantId>,
}

impl ElectionResults {
    pub fn from_roster(phase: ElectionPhase, roster: &CandidateRoster) -> Self {
        let tallies: Vec<_> = roster
            .registered()
            .map(|(id, candidate)| CandidateTally {
                candidate: id.clone(),
                votes: candidate.vote_count,
            })
            .collect();
        let total_votes = tallies.iter().map(|tally| tally.votes).sum();
        let winner = resolve_winner(roster).ok().map(|(id, _)| id.clone());
        Self {
            phase,
            tallies,
            total_votes,
            winner,
        }
    }
}

impl Display for ElectionResults {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Election {} ({} votes cast)", self.phase, self.total_votes)?;
        for tally in &self.tallies {
            writeln!(f, "  {tally}")?;
        }
        match &self.winner {
            Some(winner) if self.phase == ElectionPhase::Ended => write!(f, "Winner: {winner}"),
            Some(leader) => write!(f, "Leading: {leader}"),
            None => write!(f, "No candidates"),
        }
    }
}
