use crate::config::ReliabilityConfig;
use crate::diagnostics::health;
use anyhow::Result;
use std::future::Future;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// Restart policy for one supervised component.
#[derive(Debug, Clone, Copy)]
pub(super) struct RestartPolicy {
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
    pub max_restarts: u32,
}

impl From<&ReliabilityConfig> for RestartPolicy {
    fn from(reliability: &ReliabilityConfig) -> Self {
        Self {
            initial_backoff_secs: reliability.restart_delay_secs,
            max_backoff_secs: reliability.max_backoff_secs,
            max_restarts: reliability.max_restarts,
        }
    }
}

/// Why a supervisor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SupervisorExit {
    Shutdown,
    CircuitOpen,
}

/// Keep `run_component` alive until `shutdown` fires, restarting it with
/// exponential backoff whenever it returns or panics.
///
/// Each attempt runs in its own task. The supervisor cancels `shutdown` on
/// the way out, so whoever waits on the token stops with it.
pub(super) fn spawn_component_supervisor<F, Fut>(
    name: &'static str,
    policy: RestartPolicy,
    shutdown: CancellationToken,
    mut run_component: F,
) -> JoinHandle<SupervisorExit>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        let initial_backoff = policy.initial_backoff_secs.max(1);
        let max_backoff = policy.max_backoff_secs.max(initial_backoff);
        let mut backoff = initial_backoff;
        let mut consecutive_failures: u32 = 0;

        let exit = loop {
            tracing::info!(component = name, "daemon component starting");
            let result = match tokio::spawn(run_component()).await {
                Ok(result) => result,
                Err(join_error) => Err(anyhow::anyhow!("component task failed: {join_error}")),
            };
            if shutdown.is_cancelled() {
                tracing::info!(component = name, "daemon component stopped");
                break SupervisorExit::Shutdown;
            }

            match result {
                Ok(()) => {
                    tracing::warn!(component = name, "daemon component exited unexpectedly");
                    health::mark_component_error(name, "component exited unexpectedly");
                    backoff = initial_backoff;
                }
                Err(e) => {
                    tracing::error!(component = name, error = %e, "daemon component failed");
                    health::mark_component_error(name, &e);
                }
            }
            consecutive_failures = consecutive_failures.saturating_add(1);

            if policy.max_restarts > 0 && consecutive_failures > policy.max_restarts {
                tracing::error!(
                    component = name,
                    max_restarts = policy.max_restarts,
                    "daemon component exceeded max restarts, circuit open"
                );
                break SupervisorExit::CircuitOpen;
            }

            tokio::select! {
                () = shutdown.cancelled() => break SupervisorExit::Shutdown,
                () = tokio::time::sleep(Duration::from_secs(backoff)) => {}
            }
            health::bump_component_restart(name);
            backoff = backoff.saturating_mul(2).min(max_backoff);
        };

        shutdown.cancel();
        exit
    })
}
