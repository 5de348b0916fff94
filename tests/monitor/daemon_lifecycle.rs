use std::sync::Arc;
use std::time::Duration;

use super::monitor_harness::{self, Workspace, registry_with};
use slotwarden::config::ConfigHandle;
use slotwarden::monitor::MonitorControl;
use slotwarden::slots::{SigtermSignal, SlotKind};

#[tokio::test]
async fn daemon_reclaims_then_records_state_on_shutdown() {
    let workspace = Workspace::new(2, -1);
    workspace.write_snapshots([0x100, 0x200, 0x300]);
    let registry = registry_with(&[("sub", SlotKind::Logical, 0x100)]);
    let control = MonitorControl::new();

    let daemon = tokio::spawn(slotwarden::daemon::run_with_control(
        ConfigHandle::new(workspace.config.clone()),
        registry.clone(),
        Arc::new(SigtermSignal),
        control.clone(),
    ));

    monitor_harness::wait_until("daemon to drop the lagging slot", || {
        !registry.contains("sub")
    })
    .await;
    control.shutdown();

    tokio::time::timeout(Duration::from_secs(5), daemon)
        .await
        .expect("daemon should stop promptly")
        .unwrap()
        .unwrap();

    let state: serde_json::Value =
        serde_json::from_slice(&std::fs::read(workspace.state_file()).unwrap()).unwrap();
    let monitor = &state["components"]["slot_monitor"];
    assert!(monitor["slots_dropped_total"].as_u64().unwrap() >= 1);
    assert!(monitor["cycles"].as_u64().unwrap() >= 1);
    assert!(state.get("written_at").is_some());
}

#[tokio::test]
async fn daemon_reload_request_tightens_limits() {
    let workspace = Workspace::new(10, -1);
    workspace.write_snapshots([0x100, 0x200, 0x300]);
    let registry = registry_with(&[("sub", SlotKind::Logical, 0x100)]);
    let control = MonitorControl::new();

    let daemon = tokio::spawn(slotwarden::daemon::run_with_control(
        ConfigHandle::new(workspace.config.clone()),
        registry.clone(),
        Arc::new(SigtermSignal),
        control.clone(),
    ));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(registry.contains("sub"));

    let mut tightened = workspace.config.clone();
    tightened.monitor.max_snap_files = 1;
    tightened.save().unwrap();
    control.request_reload();

    monitor_harness::wait_until("reloaded limits to drop the slot", || {
        !registry.contains("sub")
    })
    .await;

    control.shutdown();
    tokio::time::timeout(Duration::from_secs(5), daemon)
        .await
        .expect("daemon should stop promptly")
        .unwrap()
        .unwrap();
}
