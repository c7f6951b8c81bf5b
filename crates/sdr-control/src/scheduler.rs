//! Timed command scheduling
//!
//! Each motherboard owns exactly one pending slot. The slot is a two-state
//! machine:
//!
//! ```text
//!   Idle --arm(t)--> Armed(t, batch) --clock >= t--> Idle (batch applied)
//!                      |      ^
//!                      +------+ arm(t') replaces the batch (last write wins)
//! ```
//!
//! Slots are individually locked so a cancel from another task never races
//! with the actor re-arming the same board.

use std::sync::{Mutex, MutexGuard, PoisonError};

use sdr_command::{Direction, Timestamp};

use crate::directive::DirectiveBatch;
use crate::error::ControlError;

/// Snapshot of a motherboard's pending slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Armed {
        at: Timestamp,
        directives: usize,
        direction: Option<Direction>,
    },
}

impl SlotState {
    pub fn is_armed(&self) -> bool {
        matches!(self, Self::Armed { .. })
    }
}

/// Result of arming a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// Slot was idle
    Armed,
    /// A pending batch was discarded
    Replaced { previous: Timestamp, discarded: usize },
}

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Idle,
    Armed {
        at: Timestamp,
        batch: DirectiveBatch,
    },
}

impl Slot {
    fn state(&self) -> SlotState {
        match self {
            Slot::Idle => SlotState::Idle,
            Slot::Armed { at, batch } => SlotState::Armed {
                at: *at,
                directives: batch.len(),
                direction: batch.direction,
            },
        }
    }
}

/// Per-motherboard pending-command slots
#[derive(Debug)]
pub struct TimedScheduler {
    slots: Vec<Mutex<Slot>>,
}

impl TimedScheduler {
    /// Scheduler with one idle slot per motherboard
    pub fn new(mboards: usize) -> Self {
        Self {
            slots: (0..mboards).map(|_| Mutex::new(Slot::Idle)).collect(),
        }
    }

    /// Number of motherboards
    pub fn mboards(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, mboard: usize) -> Result<MutexGuard<'_, Slot>, ControlError> {
        let slot = self
            .slots
            .get(mboard)
            .ok_or(ControlError::MotherboardOutOfRange {
                mboard,
                mboards: self.slots.len(),
            })?;
        // A panic while holding the lock leaves a complete Slot behind
        Ok(slot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Arm a motherboard's slot, replacing anything already pending
    pub fn arm(
        &self,
        mboard: usize,
        at: Timestamp,
        batch: DirectiveBatch,
    ) -> Result<ArmOutcome, ControlError> {
        let mut slot = self.slot(mboard)?;
        let previous = std::mem::replace(&mut *slot, Slot::Armed { at, batch });
        Ok(match previous {
            Slot::Idle => ArmOutcome::Armed,
            Slot::Armed { at, batch } => ArmOutcome::Replaced {
                previous: at,
                discarded: batch.len(),
            },
        })
    }

    /// Cancel a pending batch, returning its time and size
    pub fn cancel(&self, mboard: usize) -> Result<Option<(Timestamp, usize)>, ControlError> {
        let mut slot = self.slot(mboard)?;
        Ok(match std::mem::take(&mut *slot) {
            Slot::Idle => None,
            Slot::Armed { at, batch } => Some((at, batch.len())),
        })
    }

    /// Take the pending batch if `now` has reached its time
    pub fn take_due(
        &self,
        mboard: usize,
        now: Timestamp,
    ) -> Result<Option<(Timestamp, DirectiveBatch)>, ControlError> {
        let mut slot = self.slot(mboard)?;
        match &*slot {
            Slot::Armed { at, .. } if now >= *at => {}
            _ => return Ok(None),
        }
        Ok(match std::mem::take(&mut *slot) {
            Slot::Armed { at, batch } => Some((at, batch)),
            Slot::Idle => None,
        })
    }

    /// Current state of a motherboard's slot
    pub fn state(&self, mboard: usize) -> Result<SlotState, ControlError> {
        Ok(self.slot(mboard)?.state())
    }

    /// Number of armed slots
    pub fn armed_count(&self) -> usize {
        (0..self.slots.len())
            .filter(|&m| self.state(m).map(|s| s.is_armed()).unwrap_or(false))
            .count()
    }
}
