use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use super::ParticipantId;

/// The state-changing operations of an election. The caller is supplied
/// separately, since every operation is judged by who is asking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Stand as a candidate.
    ApplyAsCandidate,
    /// Withdraw a candidacy.
    CancelCandidacy,
    /// Open voting for `duration` seconds. Owner only.
    StartElection { duration: u32 },
    /// Close voting once the window has elapsed. Owner only.
    EndElection,
    /// Owner only; never succeeds.
    CancelElection,
    /// Cast a vote for `candidate`.
    Vote { candidate: ParticipantId },
}

impl Operation {
    /// May only the owner perform this operation?
    pub fn is_owner_only(&self) -> bool {
        matches!(
            self,
            Self::StartElection { .. } | Self::EndElection | Self::CancelElection
        )
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApplyAsCandidate => write!(f, "apply_as_candidate"),
            Self::CancelCandidacy => write!(f, "cancel_candidacy"),
            Self::StartElection { duration } => write!(f, "start_election({duration}s)"),
            Self::EndElection => write!(f, "end_election"),
            Self::CancelElection => write!(f, "cancel_election"),
            Self::Vote { candidate } => write!(f, "vote({candidate})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_op_tag() {
        let op: Operation = serde_json::from_str(r#"{"op": "start_election", "duration": 1200}"#)
            .unwrap();
        assert_eq!(op, Operation::StartElection { duration: 1200 });
        assert!(op.is_owner_only());

        let op: Operation = serde_json::from_str(r#"{"op": "vote", "candidate": "alice"}"#).unwrap();
        assert_eq!(
            op,
            Operation::Vote {
                candidate: ParticipantId::candidate_example1()
            }
        );
        assert!(!op.is_owner_only());
        assert_eq!(op.to_string(), "vote(alice)");
    }
}
