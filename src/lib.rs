#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod config;
pub mod daemon;
#[doc(hidden)]
pub mod diagnostics;
pub mod error;
pub mod monitor;
pub mod reclaim;
pub mod retention;
pub mod slots;
pub mod snapshot;

pub use config::{Config, ConfigHandle};
pub use error::MonitorError;
pub use monitor::{CycleReport, LogicalSlotMonitor, MonitorControl};
pub use retention::{CutoffDecision, RetentionLimits, compute_cutoff};
pub use slots::{InMemorySlotRegistry, OwnerSignal, SigtermSignal, SlotRegistry};
