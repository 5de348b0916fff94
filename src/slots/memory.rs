use super::{SlotKind, SlotRegistry, SlotView, WaitOutcome};
use crate::error::SlotError;
use crate::snapshot::Lsn;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::Notify;

struct SlotState {
    in_use: bool,
    restart_lsn: Lsn,
    active_pid: Option<u32>,
}

struct SlotEntry {
    name: String,
    kind: SlotKind,
    state: Mutex<SlotState>,
    released: Notify,
}

impl SlotEntry {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn view(&self) -> SlotView {
        let state = self.lock();
        SlotView {
            name: self.name.clone(),
            in_use: state.in_use,
            kind: self.kind,
            restart_lsn: state.restart_lsn,
            active_pid: state.active_pid,
        }
    }
}

/// Process-local slot table.
///
/// A table-wide `RwLock` guards membership and a per-slot `Mutex` guards the
/// owner and restart position, mirroring the server's control lock and slot
/// spinlock. Owners are tracked by pid; a release wakes every waiter.
#[derive(Default)]
pub struct InMemorySlotRegistry {
    slots: RwLock<Vec<Arc<SlotEntry>>>,
}

impl InMemorySlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, name: &str, kind: SlotKind, restart_lsn: Lsn) -> Result<(), SlotError> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if slots.iter().any(|entry| entry.name == name) {
            return Err(SlotError::Registry(format!(
                "replication slot \"{name}\" already exists"
            )));
        }
        slots.push(Arc::new(SlotEntry {
            name: name.to_string(),
            kind,
            state: Mutex::new(SlotState {
                in_use: true,
                restart_lsn,
                active_pid: None,
            }),
            released: Notify::new(),
        }));
        Ok(())
    }

    /// Attach `pid` as the slot's owner.
    pub fn acquire(&self, name: &str, pid: u32) -> Result<(), SlotError> {
        let entry = self.find(name)?;
        let mut state = entry.lock();
        match state.active_pid {
            Some(owner) if owner != pid => Err(SlotError::Active {
                name: name.to_string(),
                pid: owner,
            }),
            _ => {
                state.active_pid = Some(pid);
                Ok(())
            }
        }
    }

    /// Detach the current owner and wake anyone waiting on the slot.
    pub fn release(&self, name: &str) -> Result<(), SlotError> {
        let entry = self.find(name)?;
        entry.lock().active_pid = None;
        entry.released.notify_waiters();
        Ok(())
    }

    pub fn advance(&self, name: &str, restart_lsn: Lsn) -> Result<(), SlotError> {
        let entry = self.find(name)?;
        entry.lock().restart_lsn = restart_lsn;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_ok()
    }

    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn find(&self, name: &str) -> Result<Arc<SlotEntry>, SlotError> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|entry| entry.name == name)
            .map(Arc::clone)
            .ok_or_else(|| SlotError::NotFound(name.to_string()))
    }

    fn drop_now(&self, name: &str) -> Result<(), SlotError> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let index = slots
            .iter()
            .position(|entry| entry.name == name)
            .ok_or_else(|| SlotError::NotFound(name.to_string()))?;

        let entry = Arc::clone(&slots[index]);
        let mut state = entry.lock();
        if let Some(pid) = state.active_pid {
            return Err(SlotError::Active {
                name: name.to_string(),
                pid,
            });
        }
        state.in_use = false;
        drop(state);

        slots.remove(index);
        entry.released.notify_waiters();
        Ok(())
    }

    async fn wait_released(&self, name: &str, timeout: Duration) -> WaitOutcome {
        let Ok(entry) = self.find(name) else {
            return WaitOutcome::Released;
        };

        // Register interest before checking the owner so a release between
        // the check and the await is not lost.
        let notified = entry.released.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if entry.lock().active_pid.is_none() {
            return WaitOutcome::Released;
        }

        match tokio::time::timeout(timeout, notified).await {
            Ok(()) => WaitOutcome::Released,
            Err(_) => WaitOutcome::TimedOut,
        }
    }
}

impl SlotRegistry for InMemorySlotRegistry {
    fn list_slots(&self) -> Pin<Box<dyn Future<Output = Vec<SlotView>> + Send + '_>> {
        Box::pin(async move {
            self.slots
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|entry| entry.view())
                .collect()
        })
    }

    fn read_slot<'a>(
        &'a self,
        name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<SlotView>> + Send + 'a>> {
        Box::pin(async move { self.find(name).ok().map(|entry| entry.view()) })
    }

    fn drop_slot<'a>(
        &'a self,
        name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), SlotError>> + Send + 'a>> {
        Box::pin(async move { self.drop_now(name) })
    }

    fn wait_for_release<'a>(
        &'a self,
        name: &'a str,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = WaitOutcome> + Send + 'a>> {
        Box::pin(self.wait_released(name, timeout))
    }
}
