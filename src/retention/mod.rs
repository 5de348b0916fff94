//! Cutoff calculation under the file-count and directory-size limits.

use crate::config::{BYTES_PER_KB, MonitorConfig};
use crate::snapshot::{Lsn, SnapshotDescriptor};
use serde::{Deserialize, Serialize};

/// Limits enforced on the snapshot directory. Negative values disable a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionLimits {
    pub max_snapshot_files: i64,
    pub max_directory_bytes: i64,
}

impl RetentionLimits {
    pub const UNLIMITED: i64 = -1;

    pub const fn new(max_snapshot_files: i64, max_directory_bytes: i64) -> Self {
        Self {
            max_snapshot_files,
            max_directory_bytes,
        }
    }

    pub const fn unlimited() -> Self {
        Self::new(Self::UNLIMITED, Self::UNLIMITED)
    }

    /// Both limits off: no scan is needed and the cutoff is always zero.
    pub const fn is_disabled(&self) -> bool {
        self.max_snapshot_files < 0 && self.max_directory_bytes < 0
    }

    fn file_limit(&self) -> Option<usize> {
        usize::try_from(self.max_snapshot_files).ok()
    }

    fn byte_limit(&self) -> Option<u64> {
        u64::try_from(self.max_directory_bytes).ok()
    }
}

impl From<&MonitorConfig> for RetentionLimits {
    fn from(config: &MonitorConfig) -> Self {
        let max_directory_bytes = if config.max_snapdir_size_kb < 0 {
            Self::UNLIMITED
        } else {
            config.max_snapdir_size_kb.saturating_mul(BYTES_PER_KB)
        };
        Self::new(config.max_snap_files, max_directory_bytes)
    }
}

/// Which limit produced the effective cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CutoffTrigger {
    None,
    FileCount,
    DirectorySize,
}

/// Outcome of one cutoff computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutoffDecision {
    /// Slots with a restart position strictly below this are reclaimed.
    /// [`Lsn::INVALID`] means nothing is reclaimed.
    pub cutoff: Lsn,
    pub trigger: CutoffTrigger,
    /// Boundary from the file-count limit alone.
    pub count_cutoff: Option<Lsn>,
    /// Boundary from the size limit alone.
    pub size_cutoff: Option<Lsn>,
    pub snapshot_count: usize,
    pub total_bytes: u64,
    /// Bytes held by snapshots at or above the cutoff.
    pub retained_bytes: u64,
    /// The newest snapshot alone is larger than the byte budget.
    pub newest_exceeds_budget: bool,
}

impl CutoffDecision {
    pub const fn should_reclaim(&self) -> bool {
        self.cutoff.is_valid()
    }
}

/// Compute the position below which slots may be reclaimed.
///
/// The inventory is ranked newest first. The count limit keeps the
/// `max_snapshot_files` newest files; the size limit then walks the kept
/// files (or every file when the count limit is off) and stops at the first
/// one that pushes the running total over budget. When both fire, the
/// higher, more aggressive boundary wins.
pub fn compute_cutoff(inventory: &[SnapshotDescriptor], limits: RetentionLimits) -> CutoffDecision {
    let mut ranked = inventory.to_vec();
    ranked.sort_by(|a, b| b.lsn.cmp(&a.lsn));

    let total_bytes = crate::snapshot::total_bytes(&ranked);
    let mut decision = CutoffDecision {
        cutoff: Lsn::INVALID,
        trigger: CutoffTrigger::None,
        count_cutoff: None,
        size_cutoff: None,
        snapshot_count: ranked.len(),
        total_bytes,
        retained_bytes: total_bytes,
        newest_exceeds_budget: false,
    };

    if limits.is_disabled() || ranked.is_empty() {
        return decision;
    }

    let file_limit = limits.file_limit();
    if let Some(max_files) = file_limit
        && ranked.len() >= max_files
    {
        decision.count_cutoff = Some(ranked[max_files.max(1) - 1].lsn);
    }

    if let Some(budget) = limits.byte_limit() {
        let window = file_limit.map_or(ranked.len(), |max_files| {
            max_files.max(1).min(ranked.len())
        });
        let mut used: u64 = 0;
        for (index, desc) in ranked[..window].iter().enumerate() {
            used = used.saturating_add(desc.size_bytes);
            if used > budget {
                if index == 0 {
                    decision.newest_exceeds_budget = true;
                } else {
                    decision.size_cutoff = Some(ranked[index - 1].lsn);
                }
                break;
            }
        }
    }

    let (cutoff, trigger) = match (decision.count_cutoff, decision.size_cutoff) {
        (Some(count), Some(size)) if size > count => (size, CutoffTrigger::DirectorySize),
        (Some(count), _) => (count, CutoffTrigger::FileCount),
        (None, Some(size)) => (size, CutoffTrigger::DirectorySize),
        (None, None) => (Lsn::INVALID, CutoffTrigger::None),
    };
    decision.cutoff = cutoff;
    decision.trigger = trigger;

    if cutoff.is_valid() {
        decision.retained_bytes = ranked
            .iter()
            .filter(|desc| desc.lsn >= cutoff)
            .fold(0u64, |acc, desc| acc.saturating_add(desc.size_bytes));
    }

    decision
}
