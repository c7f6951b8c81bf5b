//! Error types for the control layer

use sdr_command::{CommandError, HardwareError};
use thiserror::Error;

use crate::directive::Target;

/// Errors that can occur while resolving or applying a command
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Command failed validation
    #[error("invalid command: {0}")]
    Command(#[from] CommandError),

    /// `chan` names a channel the device does not have
    #[error("channel {chan} out of range: device has {channels} channels")]
    ChannelOutOfRange { chan: usize, channels: usize },

    /// Motherboard index past the device's motherboard count
    #[error("motherboard {mboard} out of range: device has {mboards} motherboards")]
    MotherboardOutOfRange { mboard: usize, mboards: usize },

    /// Hardware refused a call partway through a batch
    ///
    /// The `applied` directives before it stay applied.
    #[error("{call} on {target} rejected after {applied} applied: {source}")]
    HardwareRejected {
        call: &'static str,
        target: Target,
        applied: usize,
        #[source]
        source: HardwareError,
    },

    /// The control actor is no longer running
    #[error("control actor closed")]
    ActorClosed,
}
