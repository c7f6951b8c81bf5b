//! Hardware collaborator interface
//!
//! The command layer never talks to RF hardware directly. Drivers (and the
//! simulator in `sdr-sim`) implement [`RadioHardware`]; the control layer
//! issues exactly one call per resolved (channel or motherboard, key) pair.

use crate::error::HardwareError;
use crate::gpio::GpioDirective;
use crate::time::Timestamp;
use crate::tune::TuneRequest;

/// Outcome of an automatic-policy tune
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TuneResult {
    /// Frequency the LO actually landed on
    pub actual_lo_freq: f64,
    /// DSP shift applied after the LO
    pub actual_dsp_freq: f64,
    /// Resulting RF center frequency
    pub actual_rf_freq: f64,
}

/// Object-safe interface to an SDR device
pub trait RadioHardware: Send {
    /// Number of channels on the device
    fn num_channels(&self) -> usize;

    /// Number of motherboards on the device
    fn num_mboards(&self) -> usize {
        1
    }

    /// Current hardware time on a motherboard
    fn time_now(&self, mboard: usize) -> Timestamp;

    /// Tune with the automatic LO/DSP policy
    fn tune(&mut self, chan: usize, request: &TuneRequest) -> Result<TuneResult, HardwareError>;

    /// Pin the LO stage, returning the actual frequency
    fn set_lo_freq(&mut self, chan: usize, hz: f64) -> Result<f64, HardwareError>;

    /// Pin the DSP stage, returning the actual frequency
    fn set_dsp_freq(&mut self, chan: usize, hz: f64) -> Result<f64, HardwareError>;

    /// Set gain in dB
    fn set_gain(&mut self, chan: usize, db: f64) -> Result<(), HardwareError>;

    /// Select an antenna port
    fn set_antenna(&mut self, chan: usize, antenna: &str) -> Result<(), HardwareError>;

    /// Set analog bandwidth in Hz
    fn set_bandwidth(&mut self, chan: usize, hz: f64) -> Result<(), HardwareError>;

    /// Set sample rate in Hz
    fn set_samp_rate(&mut self, chan: usize, hz: f64) -> Result<(), HardwareError>;

    /// Write a GPIO bank attribute
    fn set_gpio_attr(&mut self, mboard: usize, gpio: &GpioDirective) -> Result<(), HardwareError>;
}
