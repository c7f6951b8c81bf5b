//! Command key table
//!
//! Every recognized command key carries static metadata: the type its value
//! must have, the scope it applies to when no selector says otherwise, and
//! the tuning group it belongs to. Validation and scope resolution consult
//! this table instead of special-casing keys.

use std::fmt;

use crate::value::Value;

/// Recognized command keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandKey {
    /// Channel selector (`-1` = all channels)
    Chan,
    /// Gain in dB
    Gain,
    /// Center frequency in Hz (automatic policy)
    Freq,
    /// LO offset in Hz, only valid together with `freq`
    LoOffset,
    /// Complete tune request
    Tune,
    /// Manual LO frequency in Hz
    LoFreq,
    /// Manual DSP frequency in Hz
    DspFreq,
    /// TX/RX ordering hint
    Direction,
    /// Sample rate in Hz (shared clock, always all channels)
    Rate,
    /// Analog bandwidth in Hz
    Bandwidth,
    /// Command time or clear sentinel
    Time,
    /// Motherboard selector
    Mboard,
    /// Antenna port name
    Antenna,
    /// GPIO attribute write
    Gpio,
}

/// Expected value type for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Integer only
    Integer,
    /// Integer or float
    Number,
    /// String
    Text,
    /// Tune request
    TuneRequest,
    /// Timestamp or clear sentinel
    TimeSpec,
    /// GPIO directive
    Gpio,
    /// Anything; unrecognized values are ignored
    Hint,
}

impl ValueType {
    /// Check whether a value satisfies this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Integer => matches!(value, Value::Int(_)),
            Self::Number => matches!(value, Value::Int(_) | Value::Float(_)),
            Self::Text => matches!(value, Value::Str(_)),
            Self::TuneRequest => matches!(value, Value::Tune(_)),
            Self::TimeSpec => matches!(value, Value::Time(_) | Value::Clear),
            Self::Gpio => matches!(value, Value::Gpio(_)),
            Self::Hint => true,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Text => "string",
            Self::TuneRequest => "tune request",
            Self::TimeSpec => "timestamp or clear",
            Self::Gpio => "gpio directive",
            Self::Hint => "hint",
        })
    }
}

/// Scope a key applies to when the command does not narrow it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeDefault {
    /// Selects targets for other keys; never applied itself
    Selector,
    /// All channels unless `chan` names one
    PerChannel,
    /// All channels regardless of `chan`
    AllChannels,
    /// A motherboard (default 0)
    Motherboard,
    /// Not applied to hardware
    Unscoped,
}

/// Mutually exclusive tuning groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TuneGroup {
    /// `freq` + optional `lo_offset`
    Automatic,
    /// Explicit `tune` request
    Request,
    /// `lo_freq` and/or `dsp_freq`
    Manual,
}

impl TuneGroup {
    /// Returns a human-readable name for the group
    pub fn name(&self) -> &'static str {
        match self {
            Self::Automatic => "freq/lo_offset",
            Self::Request => "tune",
            Self::Manual => "lo_freq/dsp_freq",
        }
    }
}

/// Static metadata for one command key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec {
    pub key: CommandKey,
    pub name: &'static str,
    pub value_type: ValueType,
    pub scope: ScopeDefault,
    pub tune_group: Option<TuneGroup>,
}

const fn spec(
    key: CommandKey,
    name: &'static str,
    value_type: ValueType,
    scope: ScopeDefault,
    tune_group: Option<TuneGroup>,
) -> KeySpec {
    KeySpec {
        key,
        name,
        value_type,
        scope,
        tune_group,
    }
}

// Indexed by `CommandKey as usize`; order must follow the enum.
static KEY_TABLE: [KeySpec; 14] = [
    spec(CommandKey::Chan, "chan", ValueType::Integer, ScopeDefault::Selector, None),
    spec(CommandKey::Gain, "gain", ValueType::Number, ScopeDefault::PerChannel, None),
    spec(
        CommandKey::Freq,
        "freq",
        ValueType::Number,
        ScopeDefault::PerChannel,
        Some(TuneGroup::Automatic),
    ),
    spec(
        CommandKey::LoOffset,
        "lo_offset",
        ValueType::Number,
        ScopeDefault::PerChannel,
        Some(TuneGroup::Automatic),
    ),
    spec(
        CommandKey::Tune,
        "tune",
        ValueType::TuneRequest,
        ScopeDefault::PerChannel,
        Some(TuneGroup::Request),
    ),
    spec(
        CommandKey::LoFreq,
        "lo_freq",
        ValueType::Number,
        ScopeDefault::PerChannel,
        Some(TuneGroup::Manual),
    ),
    spec(
        CommandKey::DspFreq,
        "dsp_freq",
        ValueType::Number,
        ScopeDefault::PerChannel,
        Some(TuneGroup::Manual),
    ),
    spec(CommandKey::Direction, "direction", ValueType::Hint, ScopeDefault::Unscoped, None),
    spec(CommandKey::Rate, "rate", ValueType::Number, ScopeDefault::AllChannels, None),
    spec(CommandKey::Bandwidth, "bandwidth", ValueType::Number, ScopeDefault::PerChannel, None),
    spec(CommandKey::Time, "time", ValueType::TimeSpec, ScopeDefault::Unscoped, None),
    spec(CommandKey::Mboard, "mboard", ValueType::Integer, ScopeDefault::Selector, None),
    spec(CommandKey::Antenna, "antenna", ValueType::Text, ScopeDefault::PerChannel, None),
    spec(CommandKey::Gpio, "gpio", ValueType::Gpio, ScopeDefault::Motherboard, None),
];

impl CommandKey {
    /// All recognized keys in table order
    pub const ALL: [CommandKey; 14] = [
        Self::Chan,
        Self::Gain,
        Self::Freq,
        Self::LoOffset,
        Self::Tune,
        Self::LoFreq,
        Self::DspFreq,
        Self::Direction,
        Self::Rate,
        Self::Bandwidth,
        Self::Time,
        Self::Mboard,
        Self::Antenna,
        Self::Gpio,
    ];

    /// Look up a key by its wire name (case-sensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        KEY_TABLE.iter().find(|s| s.name == name).map(|s| s.key)
    }

    /// Static metadata for this key
    pub fn spec(&self) -> &'static KeySpec {
        &KEY_TABLE[*self as usize]
    }

    /// Wire name of this key
    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    /// Returns true if this key belongs to a tuning group
    pub fn is_tuning(&self) -> bool {
        self.spec().tune_group.is_some()
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
