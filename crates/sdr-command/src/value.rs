//! Typed command values

use std::fmt;

use crate::gpio::GpioDirective;
use crate::time::Timestamp;
use crate::tune::TuneRequest;

/// The kind of a [`Value`], used in type errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueKind {
    Int,
    Float,
    Str,
    Tune,
    Time,
    Gpio,
    Clear,
}

impl ValueKind {
    /// Returns a human-readable name for the kind
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int => "integer",
            Self::Float => "float",
            Self::Str => "string",
            Self::Tune => "tune request",
            Self::Time => "timestamp",
            Self::Gpio => "gpio directive",
            Self::Clear => "clear",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tagged command value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer (selectors such as `chan` and `mboard`)
    Int(i64),
    /// Floating point (frequencies, gains, rates)
    Float(f64),
    /// String (antenna names, direction hints)
    Str(String),
    /// Full automatic-policy tune request
    Tune(TuneRequest),
    /// Absolute hardware time
    Time(Timestamp),
    /// GPIO attribute write
    Gpio(GpioDirective),
    /// Nil; as a `time` value it clears the pending command time
    Clear,
}

impl Value {
    /// Get the kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Str(_) => ValueKind::Str,
            Self::Tune(_) => ValueKind::Tune,
            Self::Time(_) => ValueKind::Time,
            Self::Gpio(_) => ValueKind::Gpio,
            Self::Clear => ValueKind::Clear,
        }
    }

    /// Numeric value as `f64` (integers are widened)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer value
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for the nil value
    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Clear)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<TuneRequest> for Value {
    fn from(v: TuneRequest) -> Self {
        Self::Tune(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Self::Time(v)
    }
}

impl From<GpioDirective> for Value {
    fn from(v: GpioDirective) -> Self {
        Self::Gpio(v)
    }
}
