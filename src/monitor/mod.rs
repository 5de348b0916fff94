//! The long-lived loop that ties scanning, cutoff calculation and slot
//! reclamation together.

mod control;

pub use control::MonitorControl;

use crate::config::ConfigHandle;
use crate::diagnostics::health;
use crate::error::MonitorError;
use crate::reclaim::{ReclaimReport, SlotReclaimer};
use crate::retention::{CutoffDecision, CutoffTrigger, RetentionLimits, compute_cutoff};
use crate::slots::{OwnerSignal, SlotRegistry};
use crate::snapshot::{SnapshotDescriptor, scan_snapshot_dir};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const COMPONENT: &str = "slot_monitor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MonitorState {
    Running,
    Reloading,
    Terminating,
}

/// Why a cycle stopped before reaching the reclaimer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    LimitsDisabled,
    ScanFailed,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub limits: RetentionLimits,
    pub decision: Option<CutoffDecision>,
    pub reclaim: Option<ReclaimReport>,
    pub skipped: Option<SkipReason>,
}

impl CycleReport {
    fn skipped(limits: RetentionLimits, reason: SkipReason) -> Self {
        Self {
            limits,
            decision: None,
            reclaim: None,
            skipped: Some(reason),
        }
    }
}

/// Drops logical slots that keep too many snapshot files alive.
pub struct LogicalSlotMonitor {
    config: ConfigHandle,
    registry: Arc<dyn SlotRegistry>,
    signal: Arc<dyn OwnerSignal>,
    control: MonitorControl,
}

impl LogicalSlotMonitor {
    pub fn new(
        config: ConfigHandle,
        registry: Arc<dyn SlotRegistry>,
        signal: Arc<dyn OwnerSignal>,
        control: MonitorControl,
    ) -> Self {
        Self {
            config,
            registry,
            signal,
            control,
        }
    }

    pub fn control(&self) -> &MonitorControl {
        &self.control
    }

    /// Run until shutdown is requested.
    ///
    /// Each pass checks for shutdown, then for a pending reload, then runs one
    /// cycle and sleeps until the interval elapses or something wakes it.
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut state = MonitorState::Running;
        tracing::info!(
            snapshot_dir = %self.config.load().snapshot_dir.display(),
            "logical slot monitor started"
        );
        health::mark_component_ok(COMPONENT);

        loop {
            state = match state {
                MonitorState::Running => {
                    if self.control.is_shutdown() {
                        MonitorState::Terminating
                    } else if self.control.take_reload() {
                        MonitorState::Reloading
                    } else {
                        self.run_cycle().await;
                        self.wait_for_next_cycle().await;
                        MonitorState::Running
                    }
                }
                MonitorState::Reloading => {
                    self.reload_config();
                    MonitorState::Running
                }
                MonitorState::Terminating => {
                    tracing::info!("logical slot monitor stopping");
                    return Ok(());
                }
            };
        }
    }

    /// One scan, cutoff and reclamation pass against the current config.
    pub async fn run_cycle(&self) -> CycleReport {
        let config = self.config.load_full();
        let limits = config.retention_limits();
        if limits.is_disabled() {
            tracing::debug!("snapshot retention limits disabled; skipping cycle");
            return CycleReport::skipped(limits, SkipReason::LimitsDisabled);
        }

        let inventory = match scan_inventory(config.snapshot_dir.clone()).await {
            Ok(inventory) => inventory,
            Err(error) => {
                tracing::warn!(%error, "snapshot scan failed; retrying next cycle");
                health::mark_component_error(COMPONENT, &error);
                return CycleReport::skipped(limits, SkipReason::ScanFailed);
            }
        };

        let decision = compute_cutoff(&inventory, limits);
        log_decision(&decision, limits);

        if !decision.should_reclaim() {
            health::record_cycle(COMPONENT, decision.cutoff, 0);
            return CycleReport {
                limits,
                decision: Some(decision),
                reclaim: None,
                skipped: None,
            };
        }

        let reclaimer = SlotReclaimer::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.signal),
            config.monitor.release_wait(),
            self.control.shutdown_token(),
        );
        let reclaim = reclaimer.reclaim_below(decision.cutoff).await;
        tracing::info!(
            cutoff = %decision.cutoff,
            candidates = reclaim.candidates,
            dropped = reclaim.dropped,
            drop_failed = reclaim.drop_failed,
            vanished = reclaim.vanished,
            skipped = reclaim.skipped,
            owners_signaled = reclaim.owners_signaled,
            "reclamation pass finished"
        );
        health::record_cycle(COMPONENT, decision.cutoff, reclaim.dropped);

        CycleReport {
            limits,
            decision: Some(decision),
            reclaim: Some(reclaim),
            skipped: None,
        }
    }

    fn reload_config(&self) {
        if let Err(error) = self.config.reload() {
            tracing::warn!(%error, "config reload failed; keeping previous limits");
            health::mark_component_error(COMPONENT, format!("config reload failed: {error}"));
        }
    }

    async fn wait_for_next_cycle(&self) {
        let interval = self.interval();
        let shutdown = self.control.shutdown_token();
        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            () = self.control.woken() => {}
            () = shutdown.cancelled() => {}
        }
    }

    fn interval(&self) -> Duration {
        self.config.load().monitor.check_interval()
    }
}

async fn scan_inventory(dir: PathBuf) -> Result<Vec<SnapshotDescriptor>, MonitorError> {
    let scanned = tokio::task::spawn_blocking(move || scan_snapshot_dir(&dir))
        .await
        .map_err(|e| MonitorError::Other(anyhow::anyhow!("snapshot scan task failed: {e}")))?;
    Ok(scanned?)
}

fn log_decision(decision: &CutoffDecision, limits: RetentionLimits) {
    if decision.newest_exceeds_budget {
        tracing::warn!(
            snapshot_count = decision.snapshot_count,
            max_directory_bytes = limits.max_directory_bytes,
            "newest snapshot alone exceeds the directory size limit; not reclaiming on size"
        );
    }

    match decision.trigger {
        CutoffTrigger::FileCount => tracing::info!(
            cutoff = %decision.cutoff,
            trigger = %decision.trigger,
            snapshot_count = decision.snapshot_count,
            limit = limits.max_snapshot_files,
            "dropping logical slots with restart_lsn lower than cutoff: too many snapshot files"
        ),
        CutoffTrigger::DirectorySize => tracing::info!(
            cutoff = %decision.cutoff,
            trigger = %decision.trigger,
            total_bytes = decision.total_bytes,
            limit_bytes = limits.max_directory_bytes,
            "dropping logical slots with restart_lsn lower than cutoff: snapshot directory too large"
        ),
        CutoffTrigger::None => tracing::debug!(
            snapshot_count = decision.snapshot_count,
            total_bytes = decision.total_bytes,
            "snapshot directory within limits"
        ),
    }
}
