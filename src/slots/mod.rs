//! Capability over the host's replication slot registry.
//!
//! The registry owns the slots and their locks. The monitor only ever sees
//! immutable [`SlotView`] snapshots and asks for drops, owner signals and
//! bounded waits; no lock guard crosses this boundary.

mod memory;
mod signal;

pub use memory::InMemorySlotRegistry;
pub use signal::SigtermSignal;

use crate::error::SlotError;
use crate::snapshot::Lsn;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SlotKind {
    Logical,
    Physical,
}

/// Point-in-time copy of a slot's fields. Stale as soon as it is returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub name: String,
    pub in_use: bool,
    pub kind: SlotKind,
    pub restart_lsn: Lsn,
    pub active_pid: Option<u32>,
}

impl SlotView {
    /// An in-use logical slot holding snapshots older than `cutoff`.
    pub fn pins_below(&self, cutoff: Lsn) -> bool {
        self.in_use && self.kind == SlotKind::Logical && self.restart_lsn < cutoff
    }
}

/// Result of waiting for a slot owner to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Released,
    TimedOut,
}

/// Slot table operations the reclaimer relies on.
///
/// Implementations take the table-wide shared lock for `list_slots`, the
/// per-slot lock for `read_slot`, and must release both before returning.
pub trait SlotRegistry: Send + Sync {
    /// Snapshot every slot in registry order.
    fn list_slots(&self) -> Pin<Box<dyn Future<Output = Vec<SlotView>> + Send + '_>>;

    /// Re-read one slot. `None` once the slot no longer exists.
    fn read_slot<'a>(
        &'a self,
        name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<SlotView>> + Send + 'a>>;

    /// Drop an unowned slot. Fails if it was reacquired or already removed.
    fn drop_slot<'a>(
        &'a self,
        name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), SlotError>> + Send + 'a>>;

    /// Block until the slot's owner detaches or `timeout` elapses.
    fn wait_for_release<'a>(
        &'a self,
        name: &'a str,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = WaitOutcome> + Send + 'a>>;
}

/// Delivery of a termination request to the process owning a slot.
pub trait OwnerSignal: Send + Sync {
    fn terminate(&self, pid: u32) -> Result<(), SlotError>;
}
