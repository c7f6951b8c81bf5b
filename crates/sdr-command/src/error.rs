//! Error types for command validation and hardware access

use thiserror::Error;

use crate::key::ValueType;
use crate::value::ValueKind;

/// Errors that can occur while building or validating a command
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    /// A value does not match the type declared for its key
    #[error("type mismatch for `{key}`: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: ValueType,
        found: ValueKind,
    },

    /// More than one tuning group present, or `lo_offset` without an anchor frequency
    #[error("conflicting keys [{joined}]: {reason}", joined = .keys.join(", "))]
    ConflictingKeys {
        keys: Vec<String>,
        reason: &'static str,
    },

    /// Key not present in the command table
    ///
    /// Validation never returns this; unknown keys are dropped and logged
    /// with this message.
    #[error("unknown key: {0}")]
    UnknownKey(String),

    /// A `chan` or `mboard` selector outside its permitted domain
    #[error("invalid `{key}` selector: {value}")]
    InvalidSelector { key: &'static str, value: i64 },

    /// Legacy positional tuple with the wrong shape
    #[error("malformed command tuple: {0}")]
    MalformedTuple(String),

    /// Wire format could not be decoded
    #[error("wire format error: {0}")]
    Wire(String),
}

/// Errors reported by a hardware collaborator
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HardwareError {
    /// Requested value outside what the hardware supports
    #[error("{what} {value} out of range [{min}, {max}]")]
    OutOfRange {
        what: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Feature or setting not supported by this device
    #[error("not supported: {0}")]
    Unsupported(String),

    /// Driver-level failure
    #[error("driver error: {0}")]
    Driver(String),
}
