use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `slotwarden` - keeps logical replication slots from pinning snapshot files.
#[derive(Parser, Debug)]
#[command(name = "slotwarden")]
#[command(version)]
#[command(about = "Logical replication slot monitor.", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.slotwarden/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the snapshot directory and report the cutoff without touching slots
    Inspect {
        /// Snapshot directory (defaults to the configured one)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Override monitor.max_snap_files (-1 disables)
        #[arg(long, allow_negative_numbers = true)]
        max_snap_files: Option<i64>,

        /// Override monitor.max_snapdir_size_kb (-1 disables)
        #[arg(long, allow_negative_numbers = true)]
        max_size_kb: Option<i64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config,

    /// Show health written by a running daemon
    Status {
        /// Print the raw state file
        #[arg(long)]
        json: bool,
    },
}
