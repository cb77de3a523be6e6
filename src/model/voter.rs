use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ParticipantId;

/// What is known about a voter. Records only exist once a vote is cast.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub has_voted: bool,
}

/// Voter records by participant. An absent record means "has not voted".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterLedger {
    records: HashMap<ParticipantId, VoterRecord>,
}

impl VoterLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_voted(&self, id: &ParticipantId) -> bool {
        self.records
            .get(id)
            .map(|record| record.has_voted)
            .unwrap_or(false)
    }

    /// Mark `id` as having voted. The flag is never cleared.
    pub fn mark_voted(&mut self, id: &ParticipantId) {
        self.records.entry(id.clone()).or_default().has_voted = true;
    }

    /// Number of participants who have voted.
    pub fn turnout(&self) -> usize {
        self.records.values().filter(|record| record.has_voted).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_materialise_on_first_vote() {
        let voter = ParticipantId::voter_example(1);
        let mut ledger = VoterLedger::new();

        assert!(!ledger.has_voted(&voter));
        assert_eq!(ledger.turnout(), 0);

        ledger.mark_voted(&voter);
        ledger.mark_voted(&voter);

        assert!(ledger.has_voted(&voter));
        assert_eq!(ledger.turnout(), 1);
    }
}
