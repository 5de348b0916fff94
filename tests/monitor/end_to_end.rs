use std::sync::Arc;

use super::monitor_harness::{self, Workspace, registry_with};
use slotwarden::config::ConfigHandle;
use slotwarden::monitor::{LogicalSlotMonitor, MonitorControl};
use slotwarden::retention::CutoffTrigger;
use slotwarden::slots::{SigtermSignal, SlotKind};
use slotwarden::snapshot::Lsn;

#[tokio::test]
async fn count_limit_reclaims_slots_behind_the_third_newest_snapshot() {
    let workspace = Workspace::new(3, -1);
    workspace.write_snapshots([0x100, 0x200, 0x300, 0x400, 0x500]);
    let registry = registry_with(&[
        ("orders", SlotKind::Logical, 0x150),
        ("audit", SlotKind::Logical, 0x2FF),
        ("billing", SlotKind::Logical, 0x300),
        ("replica", SlotKind::Physical, 0x50),
    ]);
    let monitor = LogicalSlotMonitor::new(
        ConfigHandle::new(workspace.config.clone()),
        registry.clone(),
        Arc::new(SigtermSignal),
        MonitorControl::new(),
    );

    let report = monitor.run_cycle().await;
    let decision = report.decision.expect("cycle should compute a cutoff");
    assert_eq!(decision.cutoff, Lsn(0x300));
    assert_eq!(decision.trigger, CutoffTrigger::FileCount);

    let reclaim = report.reclaim.expect("cutoff should trigger reclamation");
    assert_eq!(reclaim.examined, 4);
    assert_eq!(reclaim.candidates, 2);
    assert_eq!(reclaim.dropped, 2);
    assert_eq!(reclaim.owners_signaled, 0);

    assert!(!registry.contains("orders"));
    assert!(!registry.contains("audit"));
    assert!(registry.contains("billing"));
    assert!(registry.contains("replica"));
}

#[tokio::test]
async fn size_limit_alone_reclaims_below_the_size_boundary() {
    // 100-byte files with a 1 KB budget: the ten newest fit, the eleventh does not.
    let workspace = Workspace::new(-1, 1);
    workspace.write_snapshots((1..=12).map(|n| n * 0x100));
    let registry = registry_with(&[
        ("lagging", SlotKind::Logical, 0x200),
        ("fresh", SlotKind::Logical, 0xC00),
    ]);
    let monitor = LogicalSlotMonitor::new(
        ConfigHandle::new(workspace.config.clone()),
        registry.clone(),
        Arc::new(SigtermSignal),
        MonitorControl::new(),
    );

    let report = monitor.run_cycle().await;
    let decision = report.decision.unwrap();
    assert_eq!(decision.trigger, CutoffTrigger::DirectorySize);
    assert_eq!(decision.cutoff, Lsn(0x300));
    assert_eq!(decision.retained_bytes, 1000);
    assert!(!registry.contains("lagging"));
    assert!(registry.contains("fresh"));
}

#[tokio::test]
async fn wake_runs_a_cycle_against_new_snapshot_files() {
    let workspace = Workspace::new(2, -1);
    workspace.write_snapshots([0x100]);
    let registry = registry_with(&[("sub", SlotKind::Logical, 0x150)]);
    let control = MonitorControl::new();
    let monitor = LogicalSlotMonitor::new(
        ConfigHandle::new(workspace.config.clone()),
        registry.clone(),
        Arc::new(SigtermSignal),
        control.clone(),
    );
    let task = tokio::spawn(async move { monitor.run().await });

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(registry.contains("sub"));

    workspace.write_snapshots([0x200, 0x300]);
    control.wake();
    monitor_harness::wait_until("slot behind new snapshots to be dropped", || {
        !registry.contains("sub")
    })
    .await;

    control.shutdown();
    task.await.unwrap().unwrap();
}
