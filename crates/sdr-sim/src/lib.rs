//! SDR Simulation Library
//!
//! This crate provides a simulated device for testing the control layer
//! without RF hardware. It includes:
//!
//! - **VirtualUsrp**: an in-memory [`RadioHardware`](sdr_command::RadioHardware)
//!   with range checking and an automatic-policy tune split
//! - **SimClock**: a manually driven hardware clock shared between handles
//! - **CallLog**: a record of every hardware call, in order
//!
//! # Example
//!
//! ```rust
//! use sdr_command::{RadioHardware, Timestamp, TuneRequest};
//! use sdr_sim::{HardwareCall, VirtualUsrp};
//!
//! let mut usrp = VirtualUsrp::new("B210");
//! let clock = usrp.clock();
//! let log = usrp.call_log();
//!
//! usrp.tune(0, &TuneRequest::new(915e6)).unwrap();
//! clock.advance(1.5);
//!
//! assert_eq!(usrp.time_now(0), Timestamp::new(1, 0.5));
//! assert!(matches!(log.calls()[0], HardwareCall::Tune { chan: 0, .. }));
//! ```

pub mod clock;
pub mod usrp;

pub use clock::SimClock;
pub use usrp::{CallLog, ChannelState, HardwareCall, VirtualUsrp, VirtualUsrpConfig};
