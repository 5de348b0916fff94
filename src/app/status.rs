use anyhow::{Context, Result};
use slotwarden::config::Config;
use std::fmt::Write as _;
use std::path::Path;

/// Read the daemon state file. `None` when no daemon has written one yet.
pub async fn load_state(path: &Path) -> Result<Option<serde_json::Value>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .with_context(|| format!("failed to parse state file {}", path.display())),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => {
            Err(error).with_context(|| format!("failed to read state file {}", path.display()))
        }
    }
}

fn field<'a>(value: &'a serde_json::Value, key: &str) -> &'a str {
    value.get(key).and_then(serde_json::Value::as_str).unwrap_or("-")
}

fn counter(value: &serde_json::Value, key: &str) -> u64 {
    value
        .get(key)
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0)
}

pub fn render_status(
    config: &Config,
    state_path: &Path,
    state: Option<&serde_json::Value>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "◆ slotwarden status");
    let _ = writeln!(out);
    let _ = writeln!(out, "Version     {}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(out, "Config      {}", config.config_path.display());
    let _ = writeln!(out, "Snapshots   {}", config.snapshot_dir.display());
    let _ = writeln!(out, "State file  {}", state_path.display());
    let _ = writeln!(out);

    let Some(state) = state else {
        let _ = writeln!(out, "  no daemon state recorded");
        return out;
    };

    let _ = writeln!(
        out,
        "  pid {}  uptime {}s  written {}",
        counter(state, "pid"),
        counter(state, "uptime_seconds"),
        field(state, "written_at")
    );

    let components = state
        .get("components")
        .and_then(serde_json::Value::as_object);
    for (name, component) in components.into_iter().flatten() {
        let _ = writeln!(
            out,
            "  {name:<14} {:<8} cycles {:<6} dropped {:<4} restarts {}",
            field(component, "status"),
            counter(component, "cycles"),
            counter(component, "slots_dropped_total"),
            counter(component, "restart_count"),
        );
        if let Some(cutoff) = component.get("last_cutoff").and_then(serde_json::Value::as_str) {
            let _ = writeln!(out, "  {:<14} last cutoff {cutoff}", "");
        }
        if let Some(error) = component.get("last_error").and_then(serde_json::Value::as_str) {
            let _ = writeln!(out, "  {:<14} last error: {error}", "");
        }
    }
    out
}
