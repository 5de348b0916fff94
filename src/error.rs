use std::path::PathBuf;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `slotwarden`.
///
/// Errors that abort a whole monitor cycle. Slot failures stay inside the
/// reclaimer as `SlotError`; the CLI and config loader use `anyhow::Result`
/// for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum MonitorError {
    // ── Snapshot inventory ──────────────────────────────────────────────
    #[error("scan: {0}")]
    Scan(#[from] ScanError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Snapshot scan errors ───────────────────────────────────────────────────

/// Failures while building the snapshot inventory. Every variant aborts the
/// current cycle; the monitor retries on the next tick.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to open snapshot directory {}: {source}", path.display())]
    OpenDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read entry in {}: {source}", path.display())]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to get the size of {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ─── Slot errors ────────────────────────────────────────────────────────────

/// Failures of a single slot operation. Never escapes the reclaimer.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("replication slot \"{0}\" does not exist")]
    NotFound(String),

    #[error("replication slot \"{name}\" is active for PID {pid}")]
    Active { name: String, pid: u32 },

    #[error("failed to signal PID {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("registry: {0}")]
    Registry(String),
}
