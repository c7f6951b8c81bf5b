//! Resolved directives
//!
//! A validated command expands into a [`DirectiveBatch`]: one
//! [`ResolvedDirective`] per (target, key) pair, each carrying a concrete
//! target and a concrete typed action.

use std::fmt;

use sdr_command::{
    CommandKey, Direction, GpioDirective, TimeSpec, TuneRequest, ValidatedCommand, Value,
};

use crate::error::ControlError;
use crate::scope::{Scope, ScopeResolver};
use crate::tune::resolve_tune;

/// Concrete hardware target of a directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    Channel(usize),
    Mboard(usize),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(n) => write!(f, "channel {}", n),
            Self::Mboard(n) => write!(f, "mboard {}", n),
        }
    }
}

/// A single hardware operation
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Automatic-policy tune
    Tune(TuneRequest),
    /// Pin the LO stage
    LoFreq(f64),
    /// Pin the DSP stage
    DspFreq(f64),
    Gain(f64),
    Antenna(String),
    Bandwidth(f64),
    SampleRate(f64),
    Gpio(GpioDirective),
}

impl Action {
    /// Build the action for a non-tuning key
    ///
    /// Returns `None` for selectors, hints, tuning keys, and values of the
    /// wrong type (which validation already rules out).
    pub fn from_value(key: CommandKey, value: &Value) -> Option<Self> {
        match key {
            CommandKey::Gain => value.as_f64().map(Self::Gain),
            CommandKey::Bandwidth => value.as_f64().map(Self::Bandwidth),
            CommandKey::Rate => value.as_f64().map(Self::SampleRate),
            CommandKey::Antenna => value.as_str().map(|s| Self::Antenna(s.to_string())),
            CommandKey::Gpio => match value {
                Value::Gpio(gpio) => Some(Self::Gpio(gpio.clone())),
                _ => None,
            },
            _ => None,
        }
    }

    /// Name of the hardware call this action maps to
    pub fn call_name(&self) -> &'static str {
        match self {
            Self::Tune(_) => "tune",
            Self::LoFreq(_) => "set_lo_freq",
            Self::DspFreq(_) => "set_dsp_freq",
            Self::Gain(_) => "set_gain",
            Self::Antenna(_) => "set_antenna",
            Self::Bandwidth(_) => "set_bandwidth",
            Self::SampleRate(_) => "set_samp_rate",
            Self::Gpio(_) => "set_gpio_attr",
        }
    }
}

/// An action bound to its target
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDirective {
    pub target: Target,
    pub action: Action,
}

impl ResolvedDirective {
    pub fn new(target: Target, action: Action) -> Self {
        Self { target, action }
    }
}

/// Everything one command resolves to
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveBatch {
    /// Motherboard whose clock and pending slot govern the batch
    pub mboard: usize,
    /// Command time, if any
    pub time: Option<TimeSpec>,
    /// Ordering hint for batches that fall due together
    pub direction: Option<Direction>,
    /// Directives in application order
    pub directives: Vec<ResolvedDirective>,
}

impl DirectiveBatch {
    /// Resolve a validated command against a device's shape
    ///
    /// Directives follow the command's key order. The tuning group is
    /// emitted where its first key appears; each key fans out over its
    /// targets in ascending order.
    pub fn resolve(cmd: &ValidatedCommand, resolver: &ScopeResolver) -> Result<Self, ControlError> {
        let mboard = resolver.mboard(cmd)?;
        // Checked eagerly so a bad `chan` fails even without per-channel keys
        let channel_scope = resolver.channel_scope(cmd)?;
        let tune = resolve_tune(cmd);

        let mut directives = Vec::new();
        let mut tune_emitted = false;

        for (key, value) in cmd.iter() {
            if key.is_tuning() {
                if tune_emitted {
                    continue;
                }
                tune_emitted = true;
                if let Some(tune) = &tune {
                    for target in resolver.expand(channel_scope) {
                        directives.extend(
                            tune.actions()
                                .into_iter()
                                .map(|action| ResolvedDirective::new(target, action)),
                        );
                    }
                }
                continue;
            }

            let Some(action) = Action::from_value(key, value) else {
                continue;
            };

            let scope = match &action {
                // A directive naming its own board overrides the command's
                Action::Gpio(gpio) => Scope::Motherboard(match gpio.mboard {
                    Some(m) => resolver.check_mboard(m)?,
                    None => mboard,
                }),
                _ => match resolver.scope_for(key, channel_scope, mboard) {
                    Some(scope) => scope,
                    None => continue,
                },
            };

            directives.extend(
                resolver
                    .expand(scope)
                    .into_iter()
                    .map(|target| ResolvedDirective::new(target, action.clone())),
            );
        }

        Ok(Self {
            mboard,
            time: cmd.time(),
            direction: cmd.direction(),
            directives,
        })
    }

    /// Number of directives
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    /// Returns true if the batch carries no directives
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}
