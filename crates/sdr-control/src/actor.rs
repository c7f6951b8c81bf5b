//! Control Actor
//!
//! This module provides the async actor that owns a device's [`Controller`].
//! Every command for the device goes through this one task, so a batch is
//! always applied in full before the next command is looked at.
//!
//! # Architecture
//!
//! Producers hold a cloneable [`ControlHandle`] and send commands through a
//! channel; the actor emits [`ControlEvent`]s through another. A periodic
//! tick fires timed batches whose motherboard clock has caught up.
//!
//! Events are best effort. If the event receiver is not drained, events are
//! dropped once its buffer fills; commands and timed batches keep flowing.
//!
//! Pending slots are shared with the handles, so `pending` and
//! `cancel_pending` do not wait behind queued commands.
//!
//! # Example
//!
//! ```rust,ignore
//! use sdr_command::Command;
//! use sdr_control::{spawn_controller, Controller};
//!
//! let (handle, mut events, task) = spawn_controller(Controller::new(device));
//! handle.submit(Command::new().with("freq", 1.1e9)).await?;
//! ```

use std::sync::Arc;

use sdr_command::{Command, RadioHardware, Timestamp};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::{Controller, Submission};
use crate::error::ControlError;
use crate::events::ControlEvent;
use crate::scheduler::{SlotState, TimedScheduler};

type SubmitResponse = oneshot::Sender<Result<Submission, ControlError>>;

/// Commands sent to the control actor
#[derive(Debug)]
pub enum ControlActorCommand {
    /// Process a command
    Submit {
        command: Command,
        /// Channel to send back the outcome (None for fire-and-forget)
        response: Option<SubmitResponse>,
    },

    /// Decode and process a JSON command
    SubmitJson {
        text: String,
        response: Option<SubmitResponse>,
    },

    /// Fire due batches now instead of waiting for the next tick
    Poll,

    /// Query a motherboard's pending slot
    QueryPending {
        mboard: usize,
        response: oneshot::Sender<Result<SlotState, ControlError>>,
    },

    /// Shutdown the actor
    Shutdown,
}

/// Run the control actor
///
/// Processes commands until every sender is dropped or `Shutdown` arrives.
///
/// # Arguments
///
/// * `controller` - Engine owning the device
/// * `cmd_rx` - Receiver for commands sent to the actor
/// * `event_tx` - Sender for events emitted by the actor
pub async fn run_control_actor<H: RadioHardware>(
    mut controller: Controller<H>,
    mut cmd_rx: mpsc::Receiver<ControlActorCommand>,
    event_tx: mpsc::Sender<ControlEvent>,
) {
    info!("Control actor started");

    let period = Duration::from_millis(controller.config().poll_interval_ms.max(1));
    let mut poll_timer = interval(period);
    poll_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break; };
                match cmd {
                    ControlActorCommand::Submit { command, response } => {
                        let result = controller.submit(command);
                        flush_events(&mut controller, &event_tx);
                        if let Some(response) = response {
                            let _ = response.send(result);
                        }
                    }

                    ControlActorCommand::SubmitJson { text, response } => {
                        let result = controller.submit_json(&text);
                        flush_events(&mut controller, &event_tx);
                        if let Some(response) = response {
                            let _ = response.send(result);
                        }
                    }

                    ControlActorCommand::Poll => {
                        controller.poll();
                        flush_events(&mut controller, &event_tx);
                    }

                    ControlActorCommand::QueryPending { mboard, response } => {
                        let _ = response.send(controller.pending(mboard));
                    }

                    ControlActorCommand::Shutdown => {
                        info!("Control actor shutting down");
                        break;
                    }
                }
            }
            _ = poll_timer.tick() => {
                controller.poll();
                flush_events(&mut controller, &event_tx);
            }
        }
    }

    info!("Control actor stopped");
}

/// Forward buffered events without waiting on the receiver
///
/// The actor never blocks on a slow or absent event consumer; when the
/// channel is full the event is dropped and logged instead.
fn flush_events<H: RadioHardware>(
    controller: &mut Controller<H>,
    event_tx: &mpsc::Sender<ControlEvent>,
) {
    for event in controller.drain_events() {
        match event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Event channel full, dropping {:?}", event);
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Event channel closed");
            }
        }
    }
}

/// Cloneable producer handle for a running control actor
#[derive(Debug, Clone)]
pub struct ControlHandle {
    cmd_tx: mpsc::Sender<ControlActorCommand>,
    scheduler: Arc<TimedScheduler>,
}

impl ControlHandle {
    /// Submit a command and wait for its outcome
    pub async fn submit(&self, command: Command) -> Result<Submission, ControlError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(ControlActorCommand::Submit {
            command,
            response: Some(tx),
        })
        .await?;
        rx.await.map_err(|_| ControlError::ActorClosed)?
    }

    /// Submit a JSON command and wait for its outcome
    pub async fn submit_json(&self, text: impl Into<String>) -> Result<Submission, ControlError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(ControlActorCommand::SubmitJson {
            text: text.into(),
            response: Some(tx),
        })
        .await?;
        rx.await.map_err(|_| ControlError::ActorClosed)?
    }

    /// Queue a command without waiting; the outcome arrives as events
    pub async fn send(&self, command: Command) -> Result<(), ControlError> {
        self.send_command(ControlActorCommand::Submit {
            command,
            response: None,
        })
        .await
    }

    /// Ask the actor to fire due batches now
    pub async fn poll(&self) -> Result<(), ControlError> {
        self.send_command(ControlActorCommand::Poll).await
    }

    /// State of a motherboard's pending slot
    pub fn pending(&self, mboard: usize) -> Result<SlotState, ControlError> {
        self.scheduler.state(mboard)
    }

    /// Cancel a motherboard's pending batch, returning its time
    pub fn cancel_pending(&self, mboard: usize) -> Result<Option<Timestamp>, ControlError> {
        let cancelled = self.scheduler.cancel(mboard)?;
        if let Some((at, discarded)) = cancelled {
            info!(
                "Cancelled pending batch at {} on mboard {} ({} directives)",
                at, mboard, discarded
            );
        }
        Ok(cancelled.map(|(at, _)| at))
    }

    /// Stop the actor
    pub async fn shutdown(&self) -> Result<(), ControlError> {
        self.send_command(ControlActorCommand::Shutdown).await
    }

    /// Send a raw actor command
    pub async fn send_command(&self, cmd: ControlActorCommand) -> Result<(), ControlError> {
        self.cmd_tx.send(cmd).await.map_err(|_| {
            debug!("Control actor channel closed");
            ControlError::ActorClosed
        })
    }
}

/// Spawn a control actor for a controller
///
/// Returns the producer handle, the event stream and the actor task.
pub fn spawn_controller<H: RadioHardware + 'static>(
    controller: Controller<H>,
) -> (ControlHandle, mpsc::Receiver<ControlEvent>, JoinHandle<()>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(controller.config().command_buffer.max(1));
    let (event_tx, event_rx) = mpsc::channel(controller.config().event_buffer.max(1));
    let handle = ControlHandle {
        cmd_tx,
        scheduler: controller.scheduler(),
    };
    let task = tokio::spawn(run_control_actor(controller, cmd_rx, event_tx));
    (handle, event_rx, task)
}
