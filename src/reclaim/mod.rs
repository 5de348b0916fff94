//! Forced reclamation of logical slots pinning snapshots below the cutoff.

use crate::slots::{OwnerSignal, SlotRegistry, WaitOutcome};
use crate::snapshot::Lsn;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How the eviction of one slot ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EvictionOutcome {
    Dropped,
    /// The drop call errored, e.g. the slot was reacquired in between.
    DropFailed,
    /// The slot was removed by someone else before we could drop it.
    Vanished,
    /// The slot no longer pins anything below the cutoff, e.g. it was
    /// recreated under the same name.
    Skipped,
    /// Shutdown was requested while waiting on the owner.
    Interrupted,
}

/// Tally of one reclamation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReclaimReport {
    pub examined: usize,
    pub candidates: usize,
    pub dropped: usize,
    pub drop_failed: usize,
    pub vanished: usize,
    pub skipped: usize,
    pub owners_signaled: usize,
    pub interrupted: bool,
}

#[derive(Debug, Clone, Copy)]
enum EvictionStep {
    Checking,
    Signaling(u32),
    Waiting,
}

/// Walks the registry and evicts every in-use logical slot whose restart
/// position is below a cutoff, terminating attached owners first.
#[derive(Clone)]
pub struct SlotReclaimer {
    registry: Arc<dyn SlotRegistry>,
    signal: Arc<dyn OwnerSignal>,
    release_wait: Duration,
    shutdown: CancellationToken,
}

impl SlotReclaimer {
    pub fn new(
        registry: Arc<dyn SlotRegistry>,
        signal: Arc<dyn OwnerSignal>,
        release_wait: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            signal,
            release_wait,
            shutdown,
        }
    }

    /// Evict every qualifying slot, in registry order.
    ///
    /// Per-slot failures are logged and counted; only shutdown stops the walk.
    pub async fn reclaim_below(&self, cutoff: Lsn) -> ReclaimReport {
        let mut report = ReclaimReport::default();
        if !cutoff.is_valid() {
            return report;
        }

        for slot in self.registry.list_slots().await {
            if self.shutdown.is_cancelled() {
                report.interrupted = true;
                break;
            }
            report.examined += 1;
            if !slot.pins_below(cutoff) {
                continue;
            }

            report.candidates += 1;
            tracing::info!(
                slot = %slot.name,
                restart_lsn = %slot.restart_lsn,
                %cutoff,
                "dropping slot with restart_lsn below horizon"
            );

            match self.evict(&slot.name, cutoff, &mut report).await {
                EvictionOutcome::Dropped => report.dropped += 1,
                EvictionOutcome::DropFailed => report.drop_failed += 1,
                EvictionOutcome::Vanished => report.vanished += 1,
                EvictionOutcome::Skipped => report.skipped += 1,
                EvictionOutcome::Interrupted => {
                    report.interrupted = true;
                    break;
                }
            }
        }

        report
    }

    /// Drive one slot to a terminal outcome.
    ///
    /// An attached owner is signaled and waited on, then the slot is re-read;
    /// this repeats until the slot is unowned (and dropped), gone, or no
    /// longer below `cutoff`. Owners may ignore a signal or briefly reattach,
    /// so there is no retry cap.
    pub async fn evict(
        &self,
        name: &str,
        cutoff: Lsn,
        report: &mut ReclaimReport,
    ) -> EvictionOutcome {
        let mut step = EvictionStep::Checking;
        let mut attempt: u32 = 0;

        loop {
            step = match step {
                EvictionStep::Checking => {
                    attempt = attempt.saturating_add(1);
                    match self.registry.read_slot(name).await {
                        Some(view) if view.pins_below(cutoff) => match view.active_pid {
                            None => return self.try_drop(name, attempt).await,
                            Some(pid) => EvictionStep::Signaling(pid),
                        },
                        Some(view) if view.in_use => {
                            tracing::info!(
                                slot = %name,
                                restart_lsn = %view.restart_lsn,
                                %cutoff,
                                attempt,
                                "slot no longer below cutoff; leaving it in place"
                            );
                            return EvictionOutcome::Skipped;
                        }
                        _ => {
                            tracing::warn!(
                                slot = %name,
                                attempt,
                                "slot disappeared before it could be dropped"
                            );
                            return EvictionOutcome::Vanished;
                        }
                    }
                }
                EvictionStep::Signaling(pid) => {
                    tracing::info!(slot = %name, pid, attempt, "killing slot owner");
                    report.owners_signaled += 1;
                    if let Err(error) = self.signal.terminate(pid) {
                        tracing::warn!(slot = %name, pid, %error, "failed to signal slot owner");
                    }
                    EvictionStep::Waiting
                }
                EvictionStep::Waiting => {
                    let outcome = tokio::select! {
                        biased;
                        () = self.shutdown.cancelled() => None,
                        outcome = self.registry.wait_for_release(name, self.release_wait) => {
                            Some(outcome)
                        }
                    };
                    match outcome {
                        None => return EvictionOutcome::Interrupted,
                        Some(_) if self.shutdown.is_cancelled() => {
                            return EvictionOutcome::Interrupted;
                        }
                        Some(WaitOutcome::Released) => EvictionStep::Checking,
                        Some(WaitOutcome::TimedOut) => {
                            tracing::debug!(
                                slot = %name,
                                attempt,
                                "slot owner still attached after wait"
                            );
                            EvictionStep::Checking
                        }
                    }
                }
            };
        }
    }

    async fn try_drop(&self, name: &str, attempt: u32) -> EvictionOutcome {
        match self.registry.drop_slot(name).await {
            Ok(()) => {
                tracing::info!(slot = %name, attempt, "slot dropped");
                EvictionOutcome::Dropped
            }
            Err(error) => {
                tracing::warn!(slot = %name, attempt, %error, "failed to drop slot");
                EvictionOutcome::DropFailed
            }
        }
    }
}
