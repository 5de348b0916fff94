use crate::error::ConfigError;
use crate::retention::RetentionLimits;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Bytes per configured kilobyte of snapshot directory budget.
pub const BYTES_PER_KB: i64 = 1000;

const MIN_CHECK_INTERVAL_MS: u64 = 10;
const MIN_RELEASE_WAIT_MS: u64 = 1;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory holding `<hi>-<lo>.snap` logical snapshot files
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub reliability: ReliabilityConfig,
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("pg_logical/snapshots")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config.toml"),
            snapshot_dir: default_snapshot_dir(),
            monitor: MonitorConfig::default(),
            reliability: ReliabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.monitor.validate()
    }

    /// Limits to enforce for one monitor cycle.
    pub fn retention_limits(&self) -> RetentionLimits {
        RetentionLimits::from(&self.monitor)
    }
}

// ── Monitor ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Maximum allowed `.snap` files. -1 disables the limit.
    #[serde(default = "default_max_snap_files")]
    pub max_snap_files: i64,
    /// Maximum allowed size of the snapshot directory in KB. -1 disables the limit.
    #[serde(default = "default_max_snapdir_size_kb")]
    pub max_snapdir_size_kb: i64,
    /// Delay between monitor cycles
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    /// Upper bound on a single wait for a slot owner to let go
    #[serde(default = "default_release_wait_ms")]
    pub release_wait_ms: u64,
}

fn default_max_snap_files() -> i64 {
    300
}

fn default_max_snapdir_size_kb() -> i64 {
    128
}

fn default_check_interval_ms() -> u64 {
    10_000
}

fn default_release_wait_ms() -> u64 {
    1_000
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_snap_files: default_max_snap_files(),
            max_snapdir_size_kb: default_max_snapdir_size_kb(),
            check_interval_ms: default_check_interval_ms(),
            release_wait_ms: default_release_wait_ms(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_snap_files < -1 {
            return Err(ConfigError::Validation(format!(
                "monitor.max_snap_files must be -1 or greater, got {}",
                self.max_snap_files
            )));
        }
        if self.max_snapdir_size_kb < -1 {
            return Err(ConfigError::Validation(format!(
                "monitor.max_snapdir_size_kb must be -1 or greater, got {}",
                self.max_snapdir_size_kb
            )));
        }
        if self.max_snapdir_size_kb > i64::MAX / BYTES_PER_KB {
            return Err(ConfigError::Validation(format!(
                "monitor.max_snapdir_size_kb is too large: {}",
                self.max_snapdir_size_kb
            )));
        }
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms.max(MIN_CHECK_INTERVAL_MS))
    }

    pub fn release_wait(&self) -> Duration {
        Duration::from_millis(self.release_wait_ms.max(MIN_RELEASE_WAIT_MS))
    }
}

// ── Reliability ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    /// Delay before restarting a monitor that exited unexpectedly
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    /// 0 restarts forever
    #[serde(default)]
    pub max_restarts: u32,
}

fn default_restart_delay_secs() -> u64 {
    5
}

fn default_max_backoff_secs() -> u64 {
    60
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            restart_delay_secs: default_restart_delay_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            max_restarts: 0,
        }
    }
}
