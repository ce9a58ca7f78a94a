//! Application orchestrator: wires camera, dispatcher and link together.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use camctl_camera::{CameraHandle, SimulatedCamera, SimulatedConfig};
use camctl_control::{Dispatcher, PowerAction, TelecommandHandler};
use camctl_link::{FrameWriter, LinkServer};
use camctl_protocol::StatusReport;

use crate::config::Config;
use crate::power::{self, PowerRequests};

/// How long a running function gets to finish its current shot on exit.
const FUNCTION_STOP_GRACE: Duration = Duration::from_secs(5);

/// Runs the controller until Ctrl-C or a power request.
pub async fn run(config: Config, server: LinkServer) -> anyhow::Result<()> {
    let started = Instant::now();

    // -- Camera --
    let camera = CameraHandle::new(SimulatedCamera::new(SimulatedConfig {
        capture_latency: Duration::from_millis(config.camera.capture_latency_ms),
        ..SimulatedConfig::default()
    }));
    if config.camera.bulb {
        camera.set_config_value("shutterspeed", "bulb")?;
        tracing::info!("camera set to BULB");
    }

    if let Err(e) = std::fs::create_dir_all(&config.download_folder) {
        tracing::warn!(
            folder = %config.download_folder.display(),
            error = %e,
            "cannot create download folder"
        );
    }

    // -- Dispatcher and link --
    let (power, mut power_rx) = PowerRequests::channel();
    let dispatcher = Arc::new(Mutex::new(Dispatcher::new(
        camera,
        config.download_folder.clone(),
        power,
    )));

    let writer = server.writer();
    let handle = server.start(TelecommandHandler::new(Arc::clone(&dispatcher)))?;
    tracing::info!(addr = %handle.local_addr(), "controller ready");

    // -- Main loop --
    let mut status_tick = config.status_interval().map(|period| {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval
    });

    let power_action = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("SIGINT received, shutting down");
                break None;
            }
            action = power_rx.recv() => {
                // The sender lives in the dispatcher, so `None` cannot happen
                // while the link is up.
                if let Some(action) = action {
                    break Some(action);
                }
            }
            _ = async {
                match status_tick.as_mut() {
                    Some(interval) => {
                        interval.tick().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            } => {
                publish_status(&dispatcher, &writer, started);
            }
        }
    };

    // -- Graceful shutdown --
    tracing::info!("stopping controller...");
    tokio::task::spawn_blocking(move || {
        stop_active_function(&dispatcher);
        handle.shutdown();
    })
    .await?;

    if let Some(action) = power_action {
        execute_power(action).await?;
    }

    Ok(())
}

/// Sends one status telemetry frame and a heartbeat log line.
///
/// Skipped while no client is attached or while a command is being
/// dispatched.
fn publish_status(dispatcher: &Mutex<Dispatcher>, writer: &FrameWriter, started: Instant) {
    if !writer.is_client_connected() {
        return;
    }

    let function = match dispatcher.try_lock() {
        Ok(d) => d.status(),
        Err(std::sync::TryLockError::Poisoned(p)) => p.into_inner().status(),
        Err(std::sync::TryLockError::WouldBlock) => return,
    };

    let report = StatusReport {
        uptime_secs: started.elapsed().as_secs(),
        function,
    };
    if let Err(e) = writer.send_json(&report) {
        tracing::warn!(error = %e, "failed to encode status report");
        return;
    }

    tracing::info!(uptime_secs = report.uptime_secs, "controller alive");
}

fn stop_active_function(dispatcher: &Mutex<Dispatcher>) {
    let d = dispatcher.lock().unwrap_or_else(PoisonError::into_inner);
    let running = d
        .active()
        .filter(|f| f.lifecycle().is_started() && !f.lifecycle().is_finished());
    if let Some(function) = running {
        tracing::info!(kind = ?function.kind(), "aborting active function");
        function.abort();
        if !function.wait_finished(FUNCTION_STOP_GRACE) {
            tracing::warn!("active function did not stop in time");
        }
    }
}

async fn execute_power(action: PowerAction) -> anyhow::Result<()> {
    if let Err(e) = power::execute(action).await {
        tracing::error!(%action, error = %e, "power transition failed");
        return Err(e);
    }
    Ok(())
}
