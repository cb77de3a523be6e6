use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every way an election operation can be refused.
///
/// Refusals are deterministic for a given state and input, and no refused
/// operation leaves any trace on the election.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Role(#[from] RoleError),
    #[error(transparent)]
    Phase(#[from] PhaseError),
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] figment::Error),
}

impl Error {
    /// The classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Role(_) => ErrorKind::Role,
            Self::Phase(_) => ErrorKind::Phase,
            Self::Precondition(_) => ErrorKind::Precondition,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

/// Error classifications, as they appear in logs and scenario scripts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Role,
    Phase,
    Precondition,
    Validation,
    Conflict,
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Role => "role",
            Self::Phase => "phase",
            Self::Precondition => "precondition",
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::Config => "config",
        };
        f.write_str(name)
    }
}

/// The caller's identity does not permit the action.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    #[error("owner cannot be a candidate")]
    OwnerCannotBeCandidate,
    #[error("owner cannot vote")]
    OwnerCannotVote,
    #[error("candidates cannot vote")]
    CandidateCannotVote,
    #[error("caller is not a candidate")]
    NotCandidate,
    #[error("only the owner can perform this action")]
    NotOwner,
}

/// The action is not valid in the election's current phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    #[error("not allowed after election starts")]
    AfterStart,
    #[error("not allowed outside election period")]
    OutsideElectionPeriod,
    /// Reported by `cancel_election` whenever the election is not running,
    /// including before it has started.
    #[error("election already started")]
    AlreadyStarted,
    #[error("election has not started")]
    NotStarted,
    #[error("election already ended")]
    AlreadyEnded,
}

/// A structural precondition of the action is unmet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("no candidates available")]
    NoCandidatesAvailable,
    #[error("duration out of range")]
    DurationOutOfRange,
    #[error("election still in progress")]
    ElectionInProgress,
    #[error("voting window ends beyond the representable time range")]
    WindowOutOfRange,
    #[error("no candidates")]
    NoCandidates,
}

/// The target of the action is unknown.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid candidate")]
    InvalidCandidate,
}

/// The requested effect has already happened.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("voter already voted")]
    AlreadyVoted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_the_bare_reason() {
        let err: Error = RoleError::OwnerCannotVote.into();
        assert_eq!(err.to_string(), "owner cannot vote");
        assert_eq!(err.kind(), ErrorKind::Role);

        let err: Error = PhaseError::OutsideElectionPeriod.into();
        assert_eq!(err.to_string(), "not allowed outside election period");
        assert_eq!(err.kind(), ErrorKind::Phase);

        let err: Error = ConflictError::AlreadyVoted.into();
        assert_eq!(err.to_string(), "voter already voted");
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn kinds_deserialize_from_snake_case() {
        let kind: ErrorKind = serde_json::from_str("\"precondition\"").unwrap();
        assert_eq!(kind, ErrorKind::Precondition);
        assert_eq!(kind.to_string(), "precondition");
    }
}
