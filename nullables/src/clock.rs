//! Nullable clock — deterministic time for testing.

use quest_types::Timestamp;
use std::cell::Cell;

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to.
pub struct NullClock {
    current: Cell<u64>,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: Cell::new(initial_secs),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.current.get())
    }

    /// Advance time by a number of seconds and return the new time.
    pub fn advance(&self, secs: u64) -> Timestamp {
        self.current.set(self.current.get().saturating_add(secs));
        self.now()
    }

    /// Advance to the first second strictly outside a window of `period` seconds.
    pub fn advance_past(&self, period: u64) -> Timestamp {
        self.advance(period.saturating_add(1))
    }

    pub fn set(&self, secs: u64) -> Timestamp {
        self.current.set(secs);
        self.now()
    }
}

impl Default for NullClock {
    fn default() -> Self {
        Self::new(0)
    }
}
