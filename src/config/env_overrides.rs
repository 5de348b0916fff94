use super::Config;
use std::path::PathBuf;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("SLOTWARDEN_SNAPSHOT_DIR")
            && !dir.is_empty()
        {
            self.snapshot_dir = PathBuf::from(dir);
        }

        if let Ok(raw) = std::env::var("SLOTWARDEN_MAX_SNAP_FILES")
            && let Ok(limit) = raw.parse::<i64>()
        {
            self.monitor.max_snap_files = limit;
        }

        if let Ok(raw) = std::env::var("SLOTWARDEN_MAX_SNAPDIR_SIZE_KB")
            && let Ok(limit) = raw.parse::<i64>()
        {
            self.monitor.max_snapdir_size_kb = limit;
        }

        if let Ok(raw) = std::env::var("SLOTWARDEN_CHECK_INTERVAL_MS")
            && let Ok(interval) = raw.parse::<u64>()
        {
            self.monitor.check_interval_ms = interval;
        }
    }
}
