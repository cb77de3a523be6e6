use std::fmt::{Display, Formatter};

use serde_repr::{Deserialize_repr, Serialize_repr};

/// Phases in the election lifecycle. The phase only ever moves forward.
#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize_repr,
    Deserialize_repr,
)]
#[repr(u8)]
pub enum ElectionPhase {
    /// Accepting and withdrawing candidacies.
    #[default]
    NotStarted = 0,
    /// Voting window open (or elapsed but not yet closed by the owner).
    Started = 1,
    /// Closed; the results are final.
    Ended = 2,
}

impl ElectionPhase {
    /// The phase as its ordinal status code.
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

impl Display for ElectionPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::Started => "started",
            Self::Ended => "ended",
        };
        f.write_str(name)
    }
}
