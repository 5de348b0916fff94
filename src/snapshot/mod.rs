//! Inventory of on-disk logical snapshot files.

mod lsn;
mod scanner;

pub use lsn::Lsn;
pub use scanner::{parse_snap_file_name, scan_snapshot_dir, total_bytes};

use serde::{Deserialize, Serialize};

/// One `.snap` file: the position it was taken at and its size on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDescriptor {
    pub lsn: Lsn,
    pub size_bytes: u64,
}

impl SnapshotDescriptor {
    pub const fn new(lsn: Lsn, size_bytes: u64) -> Self {
        Self { lsn, size_bytes }
    }
}
