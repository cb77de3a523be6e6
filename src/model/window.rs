use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The period during which votes are accepted: `[start_time, end_time)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingWindow {
    /// When the owner started the election.
    pub start_time: DateTime<Utc>,
    /// How long voting stays open, in whole seconds.
    pub duration_seconds: u32,
}

impl VotingWindow {
    pub fn new(start_time: DateTime<Utc>, duration_seconds: u32) -> Self {
        Self {
            start_time,
            duration_seconds,
        }
    }

    /// Like [`VotingWindow::new`], but `None` if the window would end past
    /// the last representable instant.
    pub fn checked_new(start_time: DateTime<Utc>, duration_seconds: u32) -> Option<Self> {
        let window = Self::new(start_time, duration_seconds);
        start_time.checked_add_signed(window.duration())?;
        Some(window)
    }

    pub fn duration(&self) -> Duration {
        Duration::seconds(self.duration_seconds.into())
    }

    /// Saturates at the last representable instant.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time
            .checked_add_signed(self.duration())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Is `now` inside the window?
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now < self.end_time()
    }

    /// Has the window closed by `now`?
    pub fn has_elapsed(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_time()
    }
}
