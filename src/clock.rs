use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

/// A source of the current time. The election reads it, never drives it.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Copy, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
/// Clones share the same instant, so one handle can be given to an election
/// while another is kept to advance time from outside.
#[derive(Debug, Clone)]
pub struct ManualClock {
    instant: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Create a clock frozen at `instant`.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(Mutex::new(instant)),
        }
    }

    /// Jump to the given instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.instant.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }

    /// Move time forward (or backward, for a negative duration).
    ///
    /// Panics if the result is outside the representable range; use
    /// [`ManualClock::try_advance`] for untrusted durations.
    pub fn advance(&self, duration: Duration) {
        let mut instant = self.instant.lock().unwrap_or_else(PoisonError::into_inner);
        *instant = *instant + duration;
    }

    /// Move time by `duration`, returning the new instant. The clock is left
    /// untouched and `None` returned if the result would be out of range.
    pub fn try_advance(&self, duration: Duration) -> Option<DateTime<Utc>> {
        let mut instant = self.instant.lock().unwrap_or_else(PoisonError::into_inner);
        let advanced = instant.checked_add_signed(duration)?;
        *instant = advanced;
        Some(advanced)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
