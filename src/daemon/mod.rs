use crate::config::{Config, ConfigHandle};
use crate::diagnostics::health;
use crate::monitor::{self, LogicalSlotMonitor, MonitorControl};
use crate::slots::{OwnerSignal, SlotRegistry};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::Duration;

mod state;
mod supervisor;

use state::spawn_state_writer;
use supervisor::{RestartPolicy, SupervisorExit, spawn_component_supervisor};

const STATUS_FLUSH_SECONDS: u64 = 5;
const COMPONENT: &str = "daemon";

/// Run the slot monitor under supervision until SIGTERM or Ctrl-C.
///
/// SIGHUP asks the monitor to reload `handle` from disk before its next cycle.
/// Fails once the monitor exceeds `reliability.max_restarts`.
pub async fn run(
    handle: ConfigHandle,
    registry: Arc<dyn SlotRegistry>,
    signal: Arc<dyn OwnerSignal>,
) -> Result<()> {
    run_with_control(handle, registry, signal, MonitorControl::new()).await
}

/// Like [`run`], but driven by a caller-owned [`MonitorControl`]. Calling
/// `control.shutdown()` stops the daemon the same way SIGTERM does.
pub async fn run_with_control(
    handle: ConfigHandle,
    registry: Arc<dyn SlotRegistry>,
    signal: Arc<dyn OwnerSignal>,
    control: MonitorControl,
) -> Result<()> {
    let config = handle.load_full();
    let policy = RestartPolicy::from(&config.reliability);
    let shutdown = control.shutdown_token();

    health::mark_component_ok(COMPONENT);

    let state_path = state_file_path(&config);
    let state_writer = spawn_state_writer(
        state_path.clone(),
        Duration::from_secs(STATUS_FLUSH_SECONDS),
        shutdown.clone(),
    );

    let monitor_control = control.clone();
    let supervised = spawn_component_supervisor(
        monitor::COMPONENT,
        policy,
        shutdown.clone(),
        move || {
            let monitor = LogicalSlotMonitor::new(
                handle.clone(),
                Arc::clone(&registry),
                Arc::clone(&signal),
                monitor_control.clone(),
            );
            async move { monitor.run().await }
        },
    );

    tracing::info!(
        snapshot_dir = %config.snapshot_dir.display(),
        config = %config.config_path.display(),
        "slotwarden daemon started"
    );

    let signals = wait_for_signals(&control).await;
    control.shutdown();

    let exit = match supervised.await {
        Ok(exit) => exit,
        Err(error) => {
            tracing::warn!(%error, "monitor supervisor task ended abnormally");
            SupervisorExit::Shutdown
        }
    };
    let outcome = match exit {
        SupervisorExit::Shutdown => {
            health::mark_component_error(COMPONENT, "shutdown requested");
            signals
        }
        SupervisorExit::CircuitOpen => {
            health::mark_component_error(COMPONENT, "monitor exceeded max restarts");
            Err(anyhow::anyhow!(
                "{} exceeded max restarts; daemon stopping",
                monitor::COMPONENT
            ))
        }
    };

    if let Err(error) = state_writer.await {
        tracing::warn!(%error, "state writer task ended abnormally");
    }
    state::write_state(&state_path).await;
    tracing::info!("slotwarden daemon stopped");

    outcome
}

pub fn state_file_path(config: &Config) -> PathBuf {
    state::state_file_path(config)
}

#[cfg(unix)]
async fn wait_for_signals(control: &MonitorControl) -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let shutdown = control.shutdown_token();

    loop {
        tokio::select! {
            () = shutdown.cancelled() => return Ok(()),
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received, reloading configuration");
                control.request_reload();
            }
            _ = terminate.recv() => {
                tracing::info!("SIGTERM received, shutting down");
                return Ok(());
            }
            result = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received, shutting down");
                return result.map_err(Into::into);
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signals(control: &MonitorControl) -> Result<()> {
    let shutdown = control.shutdown_token();
    tokio::select! {
        () = shutdown.cancelled() => Ok(()),
        result = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, shutting down");
            result.map_err(Into::into)
        }
    }
}
