use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

struct ControlInner {
    reload_pending: AtomicBool,
    wake: Notify,
    shutdown: CancellationToken,
}

/// External inputs to a running monitor: config reload, early wake-up and
/// shutdown. Cheap to clone; every clone drives the same monitor.
#[derive(Clone)]
pub struct MonitorControl {
    inner: Arc<ControlInner>,
}

impl MonitorControl {
    pub fn new() -> Self {
        Self::with_shutdown(CancellationToken::new())
    }

    /// Share an existing shutdown token, e.g. the daemon's.
    pub fn with_shutdown(shutdown: CancellationToken) -> Self {
        Self {
            inner: Arc::new(ControlInner {
                reload_pending: AtomicBool::new(false),
                wake: Notify::new(),
                shutdown,
            }),
        }
    }

    /// Ask the monitor to re-read its configuration before the next cycle.
    pub fn request_reload(&self) {
        self.inner.reload_pending.store(true, Ordering::Release);
        self.inner.wake.notify_one();
    }

    /// Run the next cycle now instead of waiting out the interval.
    pub fn wake(&self) {
        self.inner.wake.notify_one();
    }

    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    pub(super) fn take_reload(&self) -> bool {
        self.inner.reload_pending.swap(false, Ordering::AcqRel)
    }

    pub(super) async fn woken(&self) {
        self.inner.wake.notified().await;
    }
}

impl Default for MonitorControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, block_on, task};

    #[test]
    fn reload_flag_is_consumed_once() {
        let control = MonitorControl::new();
        control.request_reload();
        assert!(control.take_reload());
        assert!(!control.take_reload());
    }

    #[test]
    fn clones_share_shutdown() {
        let control = MonitorControl::new();
        let clone = control.clone();
        clone.shutdown();
        assert!(control.is_shutdown());
        assert!(control.shutdown_token().is_cancelled());
    }

    #[test]
    fn wake_before_wait_is_not_lost() {
        let control = MonitorControl::new();
        control.wake();
        let mut woken = task::spawn(control.woken());
        assert_ready!(woken.poll());
    }

    #[test]
    fn waiter_stays_parked_until_woken() {
        let control = MonitorControl::new();
        let mut woken = task::spawn(control.woken());
        assert_pending!(woken.poll());

        control.request_reload();
        assert!(woken.is_woken());
        assert_ready!(woken.poll());
    }

    #[test]
    fn shutdown_token_is_observable_from_clones() {
        let control = MonitorControl::new();
        let token = control.clone().shutdown_token();
        control.shutdown();
        block_on(token.cancelled());
        assert!(control.is_shutdown());
    }
}
