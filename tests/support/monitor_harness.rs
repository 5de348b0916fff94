#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use slotwarden::config::Config;
use slotwarden::error::SlotError;
use slotwarden::slots::{InMemorySlotRegistry, OwnerSignal, SlotKind};
use slotwarden::snapshot::Lsn;

pub const SNAPSHOT_BYTES: usize = 100;

/// Temporary data directory holding a config file and a snapshot directory.
pub struct Workspace {
    pub tmp: TempDir,
    pub config: Config,
}

impl Workspace {
    pub fn new(max_snap_files: i64, max_snapdir_size_kb: i64) -> Self {
        let tmp = TempDir::new().unwrap();
        let mut config = Config {
            config_path: tmp.path().join("config.toml"),
            snapshot_dir: tmp.path().join("snapshots"),
            ..Config::default()
        };
        config.monitor.max_snap_files = max_snap_files;
        config.monitor.max_snapdir_size_kb = max_snapdir_size_kb;
        config.monitor.check_interval_ms = 60_000;
        config.monitor.release_wait_ms = 20;
        config.reliability.restart_delay_secs = 1;
        std::fs::create_dir_all(&config.snapshot_dir).unwrap();
        config.save().unwrap();
        Self { tmp, config }
    }

    pub fn snapshot_dir(&self) -> &Path {
        &self.config.snapshot_dir
    }

    pub fn write_snapshots(&self, positions: impl IntoIterator<Item = u64>) {
        for position in positions {
            let lsn = Lsn(position);
            let name = format!("{:X}-{:X}.snap", lsn.hi(), lsn.lo());
            std::fs::write(self.snapshot_dir().join(name), vec![0_u8; SNAPSHOT_BYTES]).unwrap();
        }
    }

    pub fn state_file(&self) -> PathBuf {
        slotwarden::daemon::state_file_path(&self.config)
    }
}

pub fn registry_with(slots: &[(&str, SlotKind, u64)]) -> Arc<InMemorySlotRegistry> {
    let registry = Arc::new(InMemorySlotRegistry::new());
    for &(name, kind, lsn) in slots {
        registry.create(name, kind, Lsn(lsn)).unwrap();
    }
    registry
}

/// Simulated walsenders: each owner detaches from its slot after receiving
/// a set number of termination requests.
pub struct SimulatedOwners {
    registry: Arc<InMemorySlotRegistry>,
    owners: Mutex<HashMap<u32, Owner>>,
}

struct Owner {
    slot: String,
    signals_until_exit: usize,
    received: usize,
}

impl SimulatedOwners {
    pub fn new(registry: Arc<InMemorySlotRegistry>) -> Self {
        Self {
            registry,
            owners: Mutex::new(HashMap::new()),
        }
    }

    /// Attach `pid` to `slot`; it exits on the `signals_until_exit`-th SIGTERM.
    pub fn attach(&self, slot: &str, pid: u32, signals_until_exit: usize) {
        self.registry.acquire(slot, pid).unwrap();
        self.owners.lock().unwrap().insert(
            pid,
            Owner {
                slot: slot.to_string(),
                signals_until_exit,
                received: 0,
            },
        );
    }

    pub fn received(&self, pid: u32) -> usize {
        self.owners
            .lock()
            .unwrap()
            .get(&pid)
            .map_or(0, |owner| owner.received)
    }
}

impl OwnerSignal for SimulatedOwners {
    fn terminate(&self, pid: u32) -> Result<(), SlotError> {
        let mut owners = self.owners.lock().unwrap();
        let Some(owner) = owners.get_mut(&pid) else {
            return Err(SlotError::Signal {
                pid,
                source: std::io::Error::from_raw_os_error(libc::ESRCH),
            });
        };
        owner.received += 1;
        if owner.received >= owner.signals_until_exit {
            self.registry.release(&owner.slot)?;
        }
        Ok(())
    }
}

pub async fn wait_until<F>(what: &str, mut condition: F)
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}
