use crate::app::inspect::{build_report, render_inspect};
use crate::app::status::{load_state, render_status};
use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result};
use slotwarden::config::Config;
use slotwarden::retention::RetentionLimits;
use std::path::PathBuf;

async fn run_inspect(
    config: Config,
    dir: Option<PathBuf>,
    max_snap_files: Option<i64>,
    max_size_kb: Option<i64>,
    json: bool,
) -> Result<()> {
    let mut monitor = config.monitor.clone();
    if let Some(files) = max_snap_files {
        monitor.max_snap_files = files;
    }
    if let Some(kb) = max_size_kb {
        monitor.max_snapdir_size_kb = kb;
    }
    monitor.validate()?;

    let dir = dir.unwrap_or(config.snapshot_dir);
    let limits = RetentionLimits::from(&monitor);
    let report = tokio::task::spawn_blocking(move || build_report(&dir, limits))
        .await
        .context("snapshot scan task failed")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_inspect(&report));
    }
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to serialize config")?;
    println!("# {}", config.config_path.display());
    print!("{rendered}");
    Ok(())
}

async fn show_status(config: &Config, json: bool) -> Result<()> {
    let path = slotwarden::daemon::state_file_path(config);
    let state = load_state(&path).await?;
    if json {
        let value = state.unwrap_or(serde_json::Value::Null);
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", render_status(config, &path, state.as_ref()));
    }
    Ok(())
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Inspect {
            dir,
            max_snap_files,
            max_size_kb,
            json,
        } => run_inspect(config, dir, max_snap_files, max_size_kb, json).await,
        Commands::Config => show_config(&config),
        Commands::Status { json } => show_status(&config, json).await,
    }
}
