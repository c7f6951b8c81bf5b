//! Virtual USRP-style device
//!
//! Tracks per-channel RF state, validates requests against configurable
//! ranges the way a real driver would, and records every call it receives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use sdr_command::{
    GpioDirective, HardwareError, RadioHardware, Timestamp, TuneRequest, TuneResult,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::SimClock;

/// Configuration for creating a virtual device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualUsrpConfig {
    /// Display name/identifier
    pub id: String,
    /// Number of channels
    pub channels: usize,
    /// Number of motherboards
    pub mboards: usize,
    /// Gain range in dB
    pub gain_range: (f64, f64),
    /// LO tuning range in Hz
    pub freq_range: (f64, f64),
    /// Maximum sample rate in Hz
    pub max_rate: f64,
    /// Maximum analog bandwidth in Hz
    pub max_bandwidth: f64,
    /// Valid antenna port names
    pub antennas: Vec<String>,
    /// Valid GPIO bank names
    pub gpio_banks: Vec<String>,
}

impl Default for VirtualUsrpConfig {
    fn default() -> Self {
        Self {
            id: "Virtual USRP".to_string(),
            channels: 2,
            mboards: 1,
            gain_range: (0.0, 76.0),
            freq_range: (70e6, 6e9),
            max_rate: 61.44e6,
            max_bandwidth: 56e6,
            antennas: vec!["TX/RX".to_string(), "RX2".to_string()],
            gpio_banks: vec!["FP0".to_string()],
        }
    }
}

/// RF state of one channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelState {
    pub lo_freq: f64,
    pub dsp_freq: f64,
    pub gain: f64,
    pub antenna: Option<String>,
    pub bandwidth: f64,
    pub samp_rate: f64,
}

impl ChannelState {
    /// Effective RF center frequency
    pub fn center_freq(&self) -> f64 {
        self.lo_freq - self.dsp_freq
    }
}

/// One call received by the virtual device
#[derive(Debug, Clone, PartialEq)]
pub enum HardwareCall {
    Tune { chan: usize, request: TuneRequest },
    SetLoFreq { chan: usize, hz: f64 },
    SetDspFreq { chan: usize, hz: f64 },
    SetGain { chan: usize, db: f64 },
    SetAntenna { chan: usize, antenna: String },
    SetBandwidth { chan: usize, hz: f64 },
    SetSampRate { chan: usize, hz: f64 },
    SetGpioAttr { mboard: usize, gpio: GpioDirective },
}

impl HardwareCall {
    /// Channel the call targeted, if channel-scoped
    pub fn chan(&self) -> Option<usize> {
        match self {
            Self::Tune { chan, .. }
            | Self::SetLoFreq { chan, .. }
            | Self::SetDspFreq { chan, .. }
            | Self::SetGain { chan, .. }
            | Self::SetAntenna { chan, .. }
            | Self::SetBandwidth { chan, .. }
            | Self::SetSampRate { chan, .. } => Some(*chan),
            Self::SetGpioAttr { .. } => None,
        }
    }
}

/// Shared record of calls made on a virtual device
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<HardwareCall>>>,
}

impl CallLog {
    fn push(&self, call: HardwareCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// Snapshot of all calls so far
    pub fn calls(&self) -> Vec<HardwareCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return all calls so far
    pub fn take(&self) -> Vec<HardwareCall> {
        std::mem::take(&mut *self.calls.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of recorded calls
    pub fn len(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A simulated SDR device
#[derive(Debug)]
pub struct VirtualUsrp {
    config: VirtualUsrpConfig,
    channels: Vec<ChannelState>,
    gpio: HashMap<(usize, String, String), u32>,
    clock: SimClock,
    log: CallLog,
}

impl VirtualUsrp {
    /// Create a device with default settings
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_config(VirtualUsrpConfig {
            id: id.into(),
            ..Default::default()
        })
    }

    /// Create a device from configuration
    pub fn from_config(config: VirtualUsrpConfig) -> Self {
        Self {
            channels: vec![ChannelState::default(); config.channels],
            config,
            gpio: HashMap::new(),
            clock: SimClock::new(),
            log: CallLog::default(),
        }
    }

    /// Share an existing clock
    pub fn with_clock(mut self, clock: SimClock) -> Self {
        self.clock = clock;
        self
    }

    /// Get the device identifier
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Get the device configuration
    pub fn config(&self) -> &VirtualUsrpConfig {
        &self.config
    }

    /// Handle to the device clock
    pub fn clock(&self) -> SimClock {
        self.clock.clone()
    }

    /// Handle to the call log
    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }

    /// Current state of a channel
    pub fn channel(&self, chan: usize) -> Option<&ChannelState> {
        self.channels.get(chan)
    }

    /// Last value written to a GPIO attribute (masked bits merged)
    pub fn gpio_attr(&self, mboard: usize, bank: &str, attr: &str) -> Option<u32> {
        self.gpio
            .get(&(mboard, bank.to_string(), attr.to_string()))
            .copied()
    }

    fn channel_mut(&mut self, chan: usize) -> Result<&mut ChannelState, HardwareError> {
        let count = self.channels.len();
        self.channels
            .get_mut(chan)
            .ok_or_else(|| HardwareError::Driver(format!("no channel {} (have {})", chan, count)))
    }

    fn check_freq(&self, what: &'static str, hz: f64) -> Result<(), HardwareError> {
        let (min, max) = self.config.freq_range;
        check_range(what, hz, min, max)
    }
}

fn check_range(what: &'static str, value: f64, min: f64, max: f64) -> Result<(), HardwareError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(HardwareError::OutOfRange {
            what,
            value,
            min,
            max,
        })
    }
}

impl RadioHardware for VirtualUsrp {
    fn num_channels(&self) -> usize {
        self.channels.len()
    }

    fn num_mboards(&self) -> usize {
        self.config.mboards
    }

    fn time_now(&self, _mboard: usize) -> Timestamp {
        self.clock.now()
    }

    fn tune(&mut self, chan: usize, request: &TuneRequest) -> Result<TuneResult, HardwareError> {
        self.log.push(HardwareCall::Tune {
            chan,
            request: *request,
        });
        self.check_freq("frequency", request.target_freq)?;

        // The LO lands as close to target + offset as the synthesizer allows;
        // the DSP stage absorbs the rest.
        let (min, max) = self.config.freq_range;
        let lo = request.lo_freq().clamp(min, max);
        let dsp = lo - request.target_freq;

        let state = self.channel_mut(chan)?;
        state.lo_freq = lo;
        state.dsp_freq = dsp;
        debug!("Channel {} tuned to {} (LO {} Hz)", chan, request, lo);

        Ok(TuneResult {
            actual_lo_freq: lo,
            actual_dsp_freq: dsp,
            actual_rf_freq: lo - dsp,
        })
    }

    fn set_lo_freq(&mut self, chan: usize, hz: f64) -> Result<f64, HardwareError> {
        self.log.push(HardwareCall::SetLoFreq { chan, hz });
        self.check_freq("LO frequency", hz)?;
        self.channel_mut(chan)?.lo_freq = hz;
        Ok(hz)
    }

    fn set_dsp_freq(&mut self, chan: usize, hz: f64) -> Result<f64, HardwareError> {
        self.log.push(HardwareCall::SetDspFreq { chan, hz });
        let half = self.config.max_rate / 2.0;
        check_range("DSP frequency", hz, -half, half)?;
        self.channel_mut(chan)?.dsp_freq = hz;
        Ok(hz)
    }

    fn set_gain(&mut self, chan: usize, db: f64) -> Result<(), HardwareError> {
        self.log.push(HardwareCall::SetGain { chan, db });
        let (min, max) = self.config.gain_range;
        check_range("gain", db, min, max)?;
        self.channel_mut(chan)?.gain = db;
        Ok(())
    }

    fn set_antenna(&mut self, chan: usize, antenna: &str) -> Result<(), HardwareError> {
        self.log.push(HardwareCall::SetAntenna {
            chan,
            antenna: antenna.to_string(),
        });
        if !self.config.antennas.iter().any(|a| a == antenna) {
            return Err(HardwareError::Unsupported(format!("antenna {}", antenna)));
        }
        self.channel_mut(chan)?.antenna = Some(antenna.to_string());
        Ok(())
    }

    fn set_bandwidth(&mut self, chan: usize, hz: f64) -> Result<(), HardwareError> {
        self.log.push(HardwareCall::SetBandwidth { chan, hz });
        check_range("bandwidth", hz, 0.0, self.config.max_bandwidth)?;
        self.channel_mut(chan)?.bandwidth = hz;
        Ok(())
    }

    fn set_samp_rate(&mut self, chan: usize, hz: f64) -> Result<(), HardwareError> {
        self.log.push(HardwareCall::SetSampRate { chan, hz });
        check_range("sample rate", hz, 0.0, self.config.max_rate)?;
        self.channel_mut(chan)?.samp_rate = hz;
        Ok(())
    }

    fn set_gpio_attr(&mut self, mboard: usize, gpio: &GpioDirective) -> Result<(), HardwareError> {
        self.log.push(HardwareCall::SetGpioAttr {
            mboard,
            gpio: gpio.clone(),
        });
        if mboard >= self.config.mboards {
            return Err(HardwareError::Driver(format!("no motherboard {}", mboard)));
        }
        if !self.config.gpio_banks.iter().any(|b| *b == gpio.bank) {
            return Err(HardwareError::Unsupported(format!("GPIO bank {}", gpio.bank)));
        }

        let mask = gpio.mask_bits();
        let entry = self
            .gpio
            .entry((mboard, gpio.bank.clone(), gpio.attr.clone()))
            .or_insert(0);
        *entry = (*entry & !mask) | (gpio.value_bits() & mask);
        Ok(())
    }
}
