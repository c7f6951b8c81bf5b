//! SDR Console
//!
//! Reads one JSON command per line from stdin and feeds it through the
//! control actor into a simulated device whose clock runs in real time.
//!
//! ```text
//! {"freq": 2.4e9, "gain": 23.0, "antenna": "TX/RX"}
//! ["gain", 10.0, 1]
//! {"gain": 40.0, "time": [5, 0.0]}
//! ```

mod settings;

use anyhow::Context;
use sdr_control::{spawn_controller, ControlError, ControlEvent, Controller, Submission};
use sdr_sim::VirtualUsrp;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::ConsoleSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Include all our crates in the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sdr_console=info,sdr_command=info,sdr_control=info,sdr_sim=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = ConsoleSettings::load()?;
    info!(
        "Starting SDR console on {} ({} channels, {} motherboards)",
        settings.device.id, settings.device.channels, settings.device.mboards
    );

    let usrp = VirtualUsrp::from_config(settings.device.clone());
    let clock = usrp.clock();
    let (handle, mut events, actor) =
        spawn_controller(Controller::with_config(usrp, settings.controller.clone()));

    // The simulated hardware clock follows wall time
    let tick_ms = settings.controller.poll_interval_ms.max(1);
    let clock_task = tokio::spawn(async move {
        let mut timer = interval(Duration::from_millis(tick_ms));
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            timer.tick().await;
            clock.advance(tick_ms as f64 / 1000.0);
        }
    });

    let event_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            log_event(&event);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match handle.submit_json(line).await {
            Ok(Submission::Applied(report)) => {
                println!("applied {} on mboard {}", report.applied, report.mboard)
            }
            Ok(Submission::Armed { mboard, at, .. }) => {
                println!("armed for {} on mboard {}", at, mboard)
            }
            Ok(Submission::Empty) => println!("nothing to apply"),
            Err(ControlError::ActorClosed) => break,
            Err(e) => println!("error: {}", e),
        }
    }

    info!("Input closed, shutting down");
    // The actor may already be gone if it stopped on its own
    let _ = handle.shutdown().await;
    actor.await.context("Control actor panicked")?;
    clock_task.abort();
    event_task.await.context("Event logger panicked")?;

    Ok(())
}

fn log_event(event: &ControlEvent) {
    if event.is_error() {
        warn!("{:?}", event);
    } else {
        info!("{:?}", event);
    }
}
