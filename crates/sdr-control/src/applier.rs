//! Hardware dispatch
//!
//! Turns resolved directives into calls on the hardware collaborator, one
//! call per directive. There is no rollback: if the hardware rejects a
//! directive partway through a batch, the directives before it remain
//! applied and the error reports how many there were.

use sdr_command::{HardwareError, RadioHardware};
use tracing::{debug, warn};

use crate::directive::{Action, DirectiveBatch, ResolvedDirective, Target};
use crate::error::ControlError;

/// Summary of a fully applied batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
    pub mboard: usize,
    pub applied: usize,
}

/// Issue the hardware call for one directive
pub fn apply_directive<H: RadioHardware + ?Sized>(
    hardware: &mut H,
    directive: &ResolvedDirective,
) -> Result<(), HardwareError> {
    match (directive.target, &directive.action) {
        (Target::Channel(chan), Action::Tune(req)) => {
            let result = hardware.tune(chan, req)?;
            debug!(
                "Channel {} tuned to {} (LO {} Hz, DSP {} Hz)",
                chan, req, result.actual_lo_freq, result.actual_dsp_freq
            );
        }
        (Target::Channel(chan), Action::LoFreq(hz)) => {
            hardware.set_lo_freq(chan, *hz)?;
        }
        (Target::Channel(chan), Action::DspFreq(hz)) => {
            hardware.set_dsp_freq(chan, *hz)?;
        }
        (Target::Channel(chan), Action::Gain(db)) => hardware.set_gain(chan, *db)?,
        (Target::Channel(chan), Action::Antenna(name)) => hardware.set_antenna(chan, name)?,
        (Target::Channel(chan), Action::Bandwidth(hz)) => hardware.set_bandwidth(chan, *hz)?,
        (Target::Channel(chan), Action::SampleRate(hz)) => hardware.set_samp_rate(chan, *hz)?,
        (Target::Mboard(mboard), Action::Gpio(gpio)) => hardware.set_gpio_attr(mboard, gpio)?,
        (target, action) => {
            return Err(HardwareError::Unsupported(format!(
                "{} on {}",
                action.call_name(),
                target
            )))
        }
    }
    Ok(())
}

/// Apply every directive of a batch in order, stopping at the first rejection
pub fn apply_batch<H: RadioHardware + ?Sized>(
    hardware: &mut H,
    batch: &DirectiveBatch,
) -> Result<ApplyReport, ControlError> {
    for (applied, directive) in batch.directives.iter().enumerate() {
        if let Err(source) = apply_directive(hardware, directive) {
            warn!(
                "{} on {} rejected after {} of {} directives: {}",
                directive.action.call_name(),
                directive.target,
                applied,
                batch.len(),
                source
            );
            return Err(ControlError::HardwareRejected {
                call: directive.action.call_name(),
                target: directive.target,
                applied,
                source,
            });
        }
    }

    debug!(
        "Applied {} directives on mboard {}",
        batch.len(),
        batch.mboard
    );
    Ok(ApplyReport {
        mboard: batch.mboard,
        applied: batch.len(),
    })
}
