use arc_swap::ArcSwap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Config;
use crate::retention::RetentionLimits;

/// Live-reloadable configuration holder.
///
/// Wraps `Config` in an `ArcSwap` so the monitor never blocks on a reader
/// lock and a reload atomically swaps the pointer. The daemon calls
/// [`ConfigHandle::reload`] when SIGHUP arrives; the next cycle picks up the
/// new limits through [`ConfigHandle::retention_limits`].
pub struct ConfigHandle {
    inner: Arc<ArcSwap<Config>>,
    path: PathBuf,
}

impl ConfigHandle {
    /// Create a new handle seeded with `config`.
    pub fn new(config: Config) -> Self {
        let path = config.config_path.clone();
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
            path,
        }
    }

    /// Load current config snapshot. Lock-free.
    pub fn load(&self) -> arc_swap::Guard<Arc<Config>> {
        self.inner.load()
    }

    /// Return a clone of the current `Arc<Config>`.
    pub fn load_full(&self) -> Arc<Config> {
        self.inner.load_full()
    }

    /// Snapshot of the limits in force right now.
    pub fn retention_limits(&self) -> RetentionLimits {
        self.inner.load().retention_limits()
    }

    /// Reload config from disk, atomically swapping the active snapshot.
    ///
    /// On error the previous snapshot stays active.
    pub fn reload(&self) -> anyhow::Result<()> {
        let fresh = Config::load_from_path(&self.path)?;
        let limits = fresh.retention_limits();
        self.inner.store(Arc::new(fresh));
        tracing::info!(
            path = %self.path.display(),
            max_snapshot_files = limits.max_snapshot_files,
            max_directory_bytes = limits.max_directory_bytes,
            "config hot-reloaded"
        );
        Ok(())
    }

    /// Manually swap in a new config (e.g. after programmatic mutation).
    pub fn store(&self, config: Config) {
        self.inner.store(Arc::new(config));
    }

    /// Config file path being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Clone for ConfigHandle {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            path: self.path.clone(),
        }
    }
}
