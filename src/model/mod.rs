//! Election data types and the election state machine.

mod candidate;
mod election;
mod operation;
mod participant;
mod phase;
mod results;
mod voter;
mod window;

pub use candidate::{Candidate, CandidateRoster};
pub use election::Election;
pub use operation::Operation;
pub use participant::ParticipantId;
pub use phase::ElectionPhase;
pub use results::{CandidateTally, ElectionResults};
pub use voter::{VoterLedger, VoterRecord};
pub use window::VotingWindow;

/// Votes are counted with plain unsigned integers; nothing is secret.
pub type VoteCount = u64;
