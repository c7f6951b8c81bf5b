//! Controller engine
//!
//! The synchronous core that validates commands, resolves them against one
//! device, and either applies them immediately or parks them in the
//! motherboard's pending slot. The actor drives it; tests can drive it
//! directly.

use std::sync::Arc;

use sdr_command::{Command, Direction, RadioHardware, TimeSpec, Timestamp, ValidatedCommand};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::applier::{apply_batch, ApplyReport};
use crate::directive::DirectiveBatch;
use crate::error::ControlError;
use crate::events::ControlEvent;
use crate::scheduler::{ArmOutcome, SlotState, TimedScheduler};
use crate::scope::ScopeResolver;

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// How often the actor checks for due batches (ms)
    pub poll_interval_ms: u64,
    /// Capacity of the command channel
    pub command_buffer: usize,
    /// Capacity of the event channel
    pub event_buffer: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            command_buffer: 256,
            event_buffer: 256,
        }
    }
}

/// What happened to a submitted command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Submission {
    /// Applied to the hardware right away
    Applied(ApplyReport),
    /// Parked until the motherboard clock reaches `at`
    Armed {
        mboard: usize,
        at: Timestamp,
        /// Time of a pending batch this one overwrote
        replaced: Option<Timestamp>,
    },
    /// Nothing to apply (selectors or a bare time only)
    Empty,
}

/// Ordering rank for batches that fall due in the same poll
fn direction_rank(direction: Option<Direction>) -> u8 {
    match direction {
        Some(Direction::Rx) => 0,
        Some(Direction::Tx) => 1,
        None => 2,
    }
}

/// The controller engine for one device
pub struct Controller<H: RadioHardware> {
    hardware: H,
    resolver: ScopeResolver,
    scheduler: Arc<TimedScheduler>,
    config: ControllerConfig,
    event_buffer: Vec<ControlEvent>,
}

impl<H: RadioHardware> Controller<H> {
    /// Create a controller with default configuration
    pub fn new(hardware: H) -> Self {
        Self::with_config(hardware, ControllerConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(hardware: H, config: ControllerConfig) -> Self {
        let resolver = ScopeResolver::for_hardware(&hardware);
        info!(
            "Controller attached to device with {} channels on {} motherboards",
            resolver.channels(),
            resolver.mboards()
        );
        Self {
            scheduler: Arc::new(TimedScheduler::new(resolver.mboards())),
            hardware,
            resolver,
            config,
            event_buffer: Vec::new(),
        }
    }

    /// Get the current configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// Shared handle to the pending slots
    pub fn scheduler(&self) -> Arc<TimedScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Validate and process a command
    pub fn submit(&mut self, command: Command) -> Result<Submission, ControlError> {
        match command.validate() {
            Ok(validated) => self.submit_validated(validated),
            Err(e) => Err(self.reject(e.into())),
        }
    }

    /// Decode a JSON command and process it
    pub fn submit_json(&mut self, text: &str) -> Result<Submission, ControlError> {
        match sdr_command::wire::decode_command(text) {
            Ok(command) => self.submit(command),
            Err(e) => Err(self.reject(e.into())),
        }
    }

    /// Process an already validated command
    pub fn submit_validated(&mut self, cmd: ValidatedCommand) -> Result<Submission, ControlError> {
        if !cmd.ignored_keys().is_empty() {
            self.emit(ControlEvent::KeysIgnored {
                keys: cmd.ignored_keys().to_vec(),
            });
        }

        let batch = match DirectiveBatch::resolve(&cmd, &self.resolver) {
            Ok(batch) => batch,
            Err(e) => return Err(self.reject(e)),
        };

        match batch.time {
            Some(TimeSpec::At(at)) => self.arm(at, batch),
            Some(TimeSpec::Clear) => {
                self.cancel_pending(batch.mboard)?;
                self.apply_now(batch)
            }
            None => self.apply_now(batch),
        }
    }

    fn arm(&mut self, at: Timestamp, batch: DirectiveBatch) -> Result<Submission, ControlError> {
        if batch.is_empty() {
            debug!("Not arming empty batch for {} on mboard {}", at, batch.mboard);
            return Ok(Submission::Empty);
        }

        let mboard = batch.mboard;
        let directives = batch.len();
        let replaced = match self.scheduler.arm(mboard, at, batch)? {
            ArmOutcome::Armed => None,
            ArmOutcome::Replaced {
                previous,
                discarded,
            } => {
                info!(
                    "Replaced pending batch at {} on mboard {} ({} directives discarded)",
                    previous, mboard, discarded
                );
                self.emit(ControlEvent::BatchReplaced {
                    mboard,
                    previous,
                    discarded,
                });
                Some(previous)
            }
        };

        debug!(
            "Armed {} directives for {} on mboard {}",
            directives, at, mboard
        );
        self.emit(ControlEvent::BatchArmed {
            mboard,
            at,
            directives,
        });
        Ok(Submission::Armed {
            mboard,
            at,
            replaced,
        })
    }

    fn apply_now(&mut self, batch: DirectiveBatch) -> Result<Submission, ControlError> {
        if batch.is_empty() {
            return Ok(Submission::Empty);
        }
        self.apply(&batch, None).map(Submission::Applied)
    }

    fn apply(
        &mut self,
        batch: &DirectiveBatch,
        at: Option<Timestamp>,
    ) -> Result<ApplyReport, ControlError> {
        match apply_batch(&mut self.hardware, batch) {
            Ok(report) => {
                self.emit(ControlEvent::BatchApplied {
                    mboard: report.mboard,
                    directives: report.applied,
                    at,
                });
                Ok(report)
            }
            Err(e) => {
                if let ControlError::HardwareRejected {
                    call,
                    target,
                    applied,
                    source,
                } = &e
                {
                    self.emit(ControlEvent::HardwareRejected {
                        mboard: batch.mboard,
                        target: *target,
                        call: *call,
                        message: source.to_string(),
                        applied: *applied,
                    });
                }
                Err(e)
            }
        }
    }

    /// Apply every batch whose time has come
    ///
    /// Batches due together run RX first, then TX, then those without a
    /// direction, each group in ascending motherboard order. A rejected
    /// batch does not stop the others.
    pub fn poll(&mut self) -> Vec<Result<ApplyReport, ControlError>> {
        let mut due = Vec::new();
        for mboard in 0..self.scheduler.mboards() {
            let now = self.hardware.time_now(mboard);
            if let Ok(Some((at, batch))) = self.scheduler.take_due(mboard, now) {
                due.push((at, batch));
            }
        }

        // Stable sort keeps motherboard order within a rank
        due.sort_by_key(|(_, batch)| direction_rank(batch.direction));

        due.into_iter()
            .map(|(at, batch)| {
                debug!(
                    "Firing {} directives due at {} on mboard {}",
                    batch.len(),
                    at,
                    batch.mboard
                );
                self.apply(&batch, Some(at))
            })
            .collect()
    }

    /// State of a motherboard's pending slot
    pub fn pending(&self, mboard: usize) -> Result<SlotState, ControlError> {
        self.scheduler.state(mboard)
    }

    /// Cancel a motherboard's pending batch
    pub fn cancel_pending(&mut self, mboard: usize) -> Result<Option<Timestamp>, ControlError> {
        let Some((at, discarded)) = self.scheduler.cancel(mboard)? else {
            return Ok(None);
        };
        info!(
            "Cancelled pending batch at {} on mboard {} ({} directives)",
            at, mboard, discarded
        );
        self.emit(ControlEvent::BatchCancelled {
            mboard,
            at,
            discarded,
        });
        Ok(Some(at))
    }

    /// Drain buffered events
    pub fn drain_events(&mut self) -> Vec<ControlEvent> {
        std::mem::take(&mut self.event_buffer)
    }

    fn reject(&mut self, e: ControlError) -> ControlError {
        warn!("Command rejected: {}", e);
        self.emit(ControlEvent::CommandRejected {
            message: e.to_string(),
        });
        e
    }

    fn emit(&mut self, event: ControlEvent) {
        self.event_buffer.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdr_command::{GpioDirective, Value};
    use sdr_sim::{HardwareCall, SimClock, VirtualUsrp};

    fn controller() -> (Controller<VirtualUsrp>, SimClock) {
        let usrp = VirtualUsrp::new("Test");
        let clock = usrp.clock();
        (Controller::new(usrp), clock)
    }

    #[test]
    fn test_immediate_apply() {
        let (mut ctl, _) = controller();
        let result = ctl
            .submit(Command::new().with("gain", 12.0).with("chan", 1))
            .unwrap();

        assert_eq!(
            result,
            Submission::Applied(ApplyReport {
                mboard: 0,
                applied: 1
            })
        );
        assert_eq!(ctl.hardware().channel(1).unwrap().gain, 12.0);
        assert_eq!(ctl.hardware().channel(0).unwrap().gain, 0.0);
        assert_eq!(
            ctl.drain_events(),
            vec![ControlEvent::BatchApplied {
                mboard: 0,
                directives: 1,
                at: None
            }]
        );
    }

    #[test]
    fn test_timed_batch_waits_for_clock() {
        let (mut ctl, clock) = controller();
        let at = Timestamp::new(100, 0.5);
        let result = ctl
            .submit(
                Command::new()
                    .with("freq", 2.4e9)
                    .with("gain", 23.0)
                    .with("time", at),
            )
            .unwrap();

        assert_eq!(
            result,
            Submission::Armed {
                mboard: 0,
                at,
                replaced: None
            }
        );
        assert!(ctl.hardware().call_log().is_empty());

        clock.set(Timestamp::new(100, 0.4));
        assert!(ctl.poll().is_empty());

        clock.set(at);
        let fired = ctl.poll();
        assert_eq!(fired.len(), 1);
        assert_eq!(
            fired[0],
            Ok(ApplyReport {
                mboard: 0,
                applied: 4
            })
        );
        assert_eq!(ctl.pending(0).unwrap(), SlotState::Idle);
    }

    #[test]
    fn test_clear_time_cancels_and_applies() {
        let (mut ctl, _) = controller();
        ctl.submit(
            Command::new()
                .with("gain", 5.0)
                .with("time", Timestamp::new(50, 0.0)),
        )
        .unwrap();
        ctl.drain_events();

        let result = ctl
            .submit(Command::new().with("gain", 7.0).with("time", Value::Clear))
            .unwrap();
        assert!(matches!(result, Submission::Applied(_)));
        assert_eq!(ctl.pending(0).unwrap(), SlotState::Idle);

        let events = ctl.drain_events();
        assert!(matches!(
            events[0],
            ControlEvent::BatchCancelled {
                mboard: 0,
                discarded: 2,
                ..
            }
        ));
        assert!(matches!(events[1], ControlEvent::BatchApplied { .. }));
    }

    #[test]
    fn test_time_only_is_empty() {
        let (mut ctl, _) = controller();
        let result = ctl
            .submit(Command::new().with("time", Timestamp::new(5, 0.0)))
            .unwrap();
        assert_eq!(result, Submission::Empty);
        assert_eq!(ctl.pending(0).unwrap(), SlotState::Idle);
    }

    #[test]
    fn test_validation_error_emits_event() {
        let (mut ctl, _) = controller();
        let err = ctl
            .submit(Command::new().with("freq", 1e9).with("lo_freq", 1e9))
            .unwrap_err();
        assert!(matches!(err, ControlError::Command(_)));
        assert!(ctl.hardware().call_log().is_empty());

        let events = ctl.drain_events();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_error());
    }

    #[test]
    fn test_rx_fires_before_tx() {
        let clock = SimClock::new();
        let usrp = VirtualUsrp::from_config(sdr_sim::VirtualUsrpConfig {
            mboards: 2,
            ..Default::default()
        })
        .with_clock(clock.clone());
        let mut ctl = Controller::new(usrp);
        let at = Timestamp::new(10, 0.0);
        let gpio = GpioDirective::new("FP0", "OUT", 1.0, 1.0);

        ctl.submit(
            Command::new()
                .with("gpio", gpio.clone())
                .with("mboard", 0)
                .with("direction", "TX")
                .with("time", at),
        )
        .unwrap();
        ctl.submit(
            Command::new()
                .with("gpio", gpio)
                .with("mboard", 1)
                .with("direction", "RX")
                .with("time", at),
        )
        .unwrap();

        clock.set(at);
        let fired: Vec<_> = ctl
            .poll()
            .into_iter()
            .map(|r| r.unwrap().mboard)
            .collect();
        assert_eq!(fired, vec![1, 0]);

        let boards: Vec<_> = ctl
            .hardware()
            .call_log()
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                HardwareCall::SetGpioAttr { mboard, .. } => Some(mboard),
                _ => None,
            })
            .collect();
        assert_eq!(boards, vec![1, 0]);
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: ControllerConfig = serde_json::from_str(r#"{"poll_interval_ms": 5}"#).unwrap();
        assert_eq!(config.poll_interval_ms, 5);
        assert_eq!(config.command_buffer, 256);
    }
}
