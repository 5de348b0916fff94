use super::Config;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let slotwarden_dir = home.join(".slotwarden");
        let config_path = slotwarden_dir.join("config.toml");

        if !slotwarden_dir.exists() {
            fs::create_dir_all(&slotwarden_dir)
                .context("Failed to create .slotwarden directory")?;
        }

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            let mut config = Self {
                config_path,
                ..Self::default()
            };
            config.save()?;
            config.apply_env_overrides();
            config.expand_snapshot_dir();
            config.validate()?;
            Ok(config)
        }
    }

    /// Read, override and validate the config stored at `path`.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;
        config.config_path = path.to_path_buf();
        config.apply_env_overrides();
        config.expand_snapshot_dir();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }

    fn expand_snapshot_dir(&mut self) {
        if let Some(raw) = self.snapshot_dir.to_str() {
            let expanded = shellexpand::tilde(raw).into_owned();
            self.snapshot_dir = PathBuf::from(expanded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_env::lock_env;
    use tempfile::TempDir;

    #[test]
    fn load_from_path_reads_monitor_section() {
        let _env = lock_env();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
            snapshot_dir = "/var/lib/pg/pg_logical/snapshots"

            [monitor]
            max_snap_files = 12
            max_snapdir_size_kb = -1
            "#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.config_path, path);
        assert_eq!(config.monitor.max_snap_files, 12);
        assert_eq!(config.monitor.max_snapdir_size_kb, -1);
    }

    #[test]
    fn load_from_path_rejects_invalid_limits() {
        let _env = lock_env();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[monitor]\nmax_snap_files = -5\n").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("max_snap_files"));
    }

    #[test]
    fn save_then_load_keeps_values() {
        let _env = lock_env();
        let tmp = TempDir::new().unwrap();
        let mut config = Config {
            config_path: tmp.path().join("config.toml"),
            ..Config::default()
        };
        config.monitor.release_wait_ms = 250;
        config.save().unwrap();

        let loaded = Config::load_from_path(&config.config_path).unwrap();
        assert_eq!(loaded.monitor.release_wait_ms, 250);
    }
}
