//! Simulated hardware clock

use std::sync::{Arc, Mutex, PoisonError};

use sdr_command::Timestamp;

/// Hardware clock that only moves when told to
///
/// Clones share the same time, so a test can keep one handle while the
/// device that owns another is moved into an actor.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Arc<Mutex<Timestamp>>,
}

impl SimClock {
    /// Clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time
    pub fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Jump to an absolute time
    pub fn set(&self, ts: Timestamp) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = ts;
    }

    /// Move forward by `secs`
    pub fn advance(&self, secs: f64) -> Timestamp {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now.offset(secs);
        *now
    }
}
