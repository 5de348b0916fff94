use anyhow::{Context, Result};
use serde::Serialize;
use slotwarden::retention::{CutoffDecision, CutoffTrigger, RetentionLimits, compute_cutoff};
use slotwarden::snapshot::{Lsn, scan_snapshot_dir};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Dry-run view of one monitor cycle: what the scanner saw and where the
/// cutoff would land.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub snapshot_dir: PathBuf,
    pub limits: RetentionLimits,
    pub oldest: Option<Lsn>,
    pub newest: Option<Lsn>,
    pub decision: CutoffDecision,
}

pub fn build_report(dir: &Path, limits: RetentionLimits) -> Result<InspectReport> {
    let inventory = scan_snapshot_dir(dir)
        .with_context(|| format!("failed to scan snapshot directory {}", dir.display()))?;

    Ok(InspectReport {
        snapshot_dir: dir.to_path_buf(),
        limits,
        oldest: inventory.iter().map(|s| s.lsn).min(),
        newest: inventory.iter().map(|s| s.lsn).max(),
        decision: compute_cutoff(&inventory, limits),
    })
}

fn render_limit(value: i64, unit: &str) -> String {
    if value < 0 {
        "unlimited".to_string()
    } else {
        format!("{value}{unit}")
    }
}

fn render_lsn(lsn: Option<Lsn>) -> String {
    lsn.map_or_else(|| "-".to_string(), |lsn| lsn.to_string())
}

pub fn render_inspect(report: &InspectReport) -> String {
    let decision = &report.decision;
    let mut out = String::new();
    let _ = writeln!(out, "◆ Snapshot directory  {}", report.snapshot_dir.display());
    let _ = writeln!(
        out,
        "  files      {} (limit {})",
        decision.snapshot_count,
        render_limit(report.limits.max_snapshot_files, "")
    );
    let _ = writeln!(
        out,
        "  size       {} bytes (limit {})",
        decision.total_bytes,
        render_limit(report.limits.max_directory_bytes, " bytes")
    );
    let _ = writeln!(
        out,
        "  range      {} .. {}",
        render_lsn(report.oldest),
        render_lsn(report.newest)
    );
    out.push('\n');

    match decision.trigger {
        CutoffTrigger::None => {
            let _ = writeln!(out, "  within limits, no slots would be dropped");
        }
        trigger => {
            let _ = writeln!(out, "  cutoff     {} ({trigger})", decision.cutoff);
            let _ = writeln!(
                out,
                "  logical slots with restart_lsn below {} would be dropped",
                decision.cutoff
            );
            let _ = writeln!(out, "  retained   {} bytes", decision.retained_bytes);
        }
    }

    if decision.newest_exceeds_budget {
        let _ = writeln!(
            out,
            "  warning: the newest snapshot alone exceeds the size limit"
        );
    }
    out
}
