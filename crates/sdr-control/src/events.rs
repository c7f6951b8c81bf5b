//! Unified event stream for the controller
//!
//! Everything the controller does (immediate application, arming, firing,
//! cancellation, rejection) is reported through a single event channel so an
//! observer sees one consistently ordered history.

use sdr_command::Timestamp;

use crate::directive::Target;

/// Controller activity
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    // -------------------------------------------------------------------------
    // Application events
    // -------------------------------------------------------------------------
    /// A batch reached the hardware in full
    BatchApplied {
        /// Motherboard the batch belongs to
        mboard: usize,
        /// Number of hardware calls issued
        directives: usize,
        /// Scheduled time, or None for immediate application
        at: Option<Timestamp>,
    },

    /// The hardware refused a directive partway through a batch
    HardwareRejected {
        mboard: usize,
        target: Target,
        /// Hardware call that failed
        call: &'static str,
        /// Driver message
        message: String,
        /// Directives applied before the failure (not rolled back)
        applied: usize,
    },

    // -------------------------------------------------------------------------
    // Scheduling events
    // -------------------------------------------------------------------------
    /// A timed batch is now pending
    BatchArmed {
        mboard: usize,
        at: Timestamp,
        directives: usize,
    },

    /// A pending batch was overwritten before it fired
    BatchReplaced {
        mboard: usize,
        /// Time of the discarded batch
        previous: Timestamp,
        /// Size of the discarded batch
        discarded: usize,
    },

    /// A pending batch was cancelled
    BatchCancelled {
        mboard: usize,
        at: Timestamp,
        discarded: usize,
    },

    // -------------------------------------------------------------------------
    // Validation events
    // -------------------------------------------------------------------------
    /// Keys dropped during validation
    KeysIgnored { keys: Vec<String> },

    /// A command was refused before reaching the hardware
    CommandRejected { message: String },
}

impl ControlEvent {
    /// Check if this event concerns the pending slot
    pub fn is_schedule_event(&self) -> bool {
        matches!(
            self,
            ControlEvent::BatchArmed { .. }
                | ControlEvent::BatchReplaced { .. }
                | ControlEvent::BatchCancelled { .. }
        )
    }

    /// Check if this event reports a failure
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ControlEvent::HardwareRejected { .. }
                | ControlEvent::CommandRejected { .. }
        )
    }

    /// Get the motherboard if this event is tied to one
    pub fn mboard(&self) -> Option<usize> {
        match self {
            ControlEvent::BatchApplied { mboard, .. }
            | ControlEvent::HardwareRejected { mboard, .. }
            | ControlEvent::BatchArmed { mboard, .. }
            | ControlEvent::BatchReplaced { mboard, .. }
            | ControlEvent::BatchCancelled { mboard, .. } => Some(*mboard),
            _ => None,
        }
    }
}
