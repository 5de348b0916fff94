use crate::config::Config;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

const STATE_FILE_NAME: &str = "daemon_state.json";

#[derive(Debug, Clone, serde::Serialize)]
struct DaemonStatus {
    #[serde(flatten)]
    snapshot: serde_json::Map<String, serde_json::Value>,
    written_at: String,
}

pub(super) fn state_file_path(config: &Config) -> PathBuf {
    config
        .config_path
        .parent()
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(STATE_FILE_NAME)
}

pub(super) async fn write_state(path: &Path) {
    let mut json = crate::diagnostics::health::snapshot_json();
    if let Some(snapshot) = json.as_object().cloned() {
        let status = DaemonStatus {
            snapshot,
            written_at: Utc::now().to_rfc3339(),
        };
        json = serde_json::to_value(status).unwrap_or_else(|_| serde_json::json!({}));
    }

    let data = serde_json::to_vec_pretty(&json).unwrap_or_else(|_| b"{}".to_vec());
    if let Err(error) = tokio::fs::write(path, data).await {
        tracing::warn!(%error, path = %path.display(), "failed to write daemon state file");
    }
}

/// Flush the health snapshot to `path` every `every` until shutdown.
pub(super) fn spawn_state_writer(
    path: PathBuf,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Some(parent) = path.parent()
            && let Err(error) = tokio::fs::create_dir_all(parent).await
        {
            tracing::warn!(%error, "failed to create state file directory");
        }

        let mut interval = tokio::time::interval(every);
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = interval.tick() => write_state(&path).await,
            }
        }
    })
}
