//! SDR Command Library
//!
//! This crate provides the command model for controlling a software-defined
//! radio front end through key/value property sets:
//!
//! - **Command**: an ordered set of keys (`freq`, `gain`, `antenna`, ...) with typed values
//! - **Validation**: type checking and tuning-group conflict detection
//! - **Key table**: static per-key metadata (expected type, default scope, tuning group)
//! - **Hardware interface**: the [`RadioHardware`] trait implemented by drivers and simulators
//!
//! # Architecture
//!
//! Commands arrive either in dictionary form or as a legacy positional tuple
//! `(name, value, [channel])`. Both are normalized into the same [`Command`]
//! structure at ingestion; nothing downstream knows which form was used.
//!
//! Validation produces an immutable [`ValidatedCommand`]. Unknown keys are
//! dropped with a warning rather than rejected, so senders can carry extra
//! keys meant for other consumers.
//!
//! # Example
//!
//! ```rust
//! use sdr_command::{Command, CommandKey, Value};
//!
//! let cmd = Command::new()
//!     .with("freq", 2.4e9)
//!     .with("gain", 23.0)
//!     .with("antenna", "TX/RX");
//!
//! let validated = cmd.validate().unwrap();
//! assert_eq!(validated.float(CommandKey::Freq), Some(2.4e9));
//!
//! // The legacy tuple form normalizes to the same structure
//! let legacy = Command::from_positional(vec![Value::from("gain"), Value::from(10.0)]).unwrap();
//! assert_eq!(legacy.get("gain"), Some(&Value::Float(10.0)));
//! ```

pub mod command;
pub mod error;
pub mod gpio;
pub mod hardware;
pub mod key;
pub mod time;
pub mod tune;
pub mod validate;
pub mod value;
#[cfg(feature = "serde")]
pub mod wire;

pub use command::Command;
pub use error::{CommandError, HardwareError};
pub use gpio::GpioDirective;
pub use hardware::{RadioHardware, TuneResult};
pub use key::{CommandKey, KeySpec, ScopeDefault, TuneGroup, ValueType};
pub use time::{TimeSpec, Timestamp};
pub use tune::{Direction, TuneRequest};
pub use validate::ValidatedCommand;
pub use value::{Value, ValueKind};
