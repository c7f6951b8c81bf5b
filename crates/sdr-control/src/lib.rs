//! SDR Control Engine
//!
//! This crate turns validated property-set commands into hardware calls on an
//! SDR front end.
//!
//! # Architecture
//!
//! A command passes through four stages:
//!
//! - **Scope resolution**: `chan`/`mboard` selectors and the per-key table
//!   decide which channels or motherboards each key targets
//! - **Tune resolution**: `tune`, `freq`+`lo_offset` or `lo_freq`/`dsp_freq`
//!   collapse to one canonical tuning directive per channel
//! - **Scheduling**: a command carrying a `time` parks in its motherboard's
//!   single pending slot until the hardware clock reaches it (last write wins)
//! - **Application**: one hardware call per (target, action), stopping at the
//!   first rejection without rollback
//!
//! # Actor
//!
//! [`Controller`] is synchronous. [`spawn_controller`] runs it inside a tokio
//! actor so any number of producers can share one device through
//! [`ControlHandle`], with all activity reported as [`ControlEvent`]s.
//!
//! # Example
//!
//! ```rust,ignore
//! use sdr_command::{Command, Timestamp};
//! use sdr_control::{Controller, Submission};
//!
//! let mut controller = Controller::new(device);
//!
//! // Applied right away on every channel
//! controller.submit(Command::new().with("freq", 1.1e9))?;
//!
//! // Held until the device clock reaches 100.5 s
//! let armed = controller.submit(
//!     Command::new().with("gain", 23.0).with("time", Timestamp::new(100, 0.5)),
//! )?;
//! assert!(matches!(armed, Submission::Armed { .. }));
//! controller.poll();
//! ```

pub mod actor;
pub mod applier;
pub mod directive;
pub mod engine;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod scope;
pub mod tune;

// Re-export actor types
pub use actor::{run_control_actor, spawn_controller, ControlActorCommand, ControlHandle};

// Re-export engine types
pub use applier::{apply_batch, apply_directive, ApplyReport};
pub use directive::{Action, DirectiveBatch, ResolvedDirective, Target};
pub use engine::{Controller, ControllerConfig, Submission};
pub use error::ControlError;
pub use events::ControlEvent;
pub use scheduler::{ArmOutcome, SlotState, TimedScheduler};
pub use scope::{Scope, ScopeResolver};
pub use tune::{resolve_tune, TuneDirective};

// The hardware seam lives in sdr-command so simulators need not depend on this crate
pub use sdr_command::{HardwareError, RadioHardware, TuneResult};
