use std::sync::Arc;

use super::monitor_harness::{SimulatedOwners, Workspace, registry_with};
use slotwarden::config::ConfigHandle;
use slotwarden::monitor::{LogicalSlotMonitor, MonitorControl};
use slotwarden::slots::SlotKind;

#[tokio::test]
async fn stubborn_owner_is_signaled_until_it_lets_go() {
    let workspace = Workspace::new(1, -1);
    workspace.write_snapshots([0x100, 0x200]);
    let registry = registry_with(&[("sub", SlotKind::Logical, 0x100)]);
    let owners = Arc::new(SimulatedOwners::new(registry.clone()));
    owners.attach("sub", 4242, 3);

    let monitor = LogicalSlotMonitor::new(
        ConfigHandle::new(workspace.config.clone()),
        registry.clone(),
        owners.clone(),
        MonitorControl::new(),
    );

    let reclaim = monitor.run_cycle().await.reclaim.unwrap();
    assert_eq!(reclaim.owners_signaled, 3);
    assert_eq!(reclaim.dropped, 1);
    assert_eq!(owners.received(4242), 3);
    assert!(!registry.contains("sub"));
}

#[tokio::test]
async fn one_owned_slot_does_not_block_its_neighbours() {
    let workspace = Workspace::new(1, -1);
    workspace.write_snapshots([0x100, 0x200]);
    let registry = registry_with(&[
        ("held", SlotKind::Logical, 0x10),
        ("idle", SlotKind::Logical, 0x20),
    ]);
    let owners = Arc::new(SimulatedOwners::new(registry.clone()));
    owners.attach("held", 7, 2);

    let monitor = LogicalSlotMonitor::new(
        ConfigHandle::new(workspace.config.clone()),
        registry.clone(),
        owners.clone(),
        MonitorControl::new(),
    );

    let reclaim = monitor.run_cycle().await.reclaim.unwrap();
    assert_eq!(reclaim.dropped, 2);
    assert_eq!(reclaim.owners_signaled, 2);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn shutdown_during_owner_wait_leaves_slot_in_place() {
    let workspace = Workspace::new(1, -1);
    workspace.write_snapshots([0x100, 0x200]);
    let registry = registry_with(&[("sub", SlotKind::Logical, 0x100)]);
    let owners = Arc::new(SimulatedOwners::new(registry.clone()));
    owners.attach("sub", 99, usize::MAX);

    let control = MonitorControl::new();
    let monitor = Arc::new(LogicalSlotMonitor::new(
        ConfigHandle::new(workspace.config.clone()),
        registry.clone(),
        owners.clone(),
        control.clone(),
    ));

    let cycle = {
        let monitor = Arc::clone(&monitor);
        tokio::spawn(async move { monitor.run_cycle().await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(60)).await;
    control.shutdown();

    let report = tokio::time::timeout(std::time::Duration::from_secs(5), cycle)
        .await
        .expect("cycle should stop once shutdown is requested")
        .unwrap();
    let reclaim = report.reclaim.unwrap();
    assert!(reclaim.interrupted);
    assert_eq!(reclaim.dropped, 0);
    assert!(registry.contains("sub"));
}
