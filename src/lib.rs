//! ContextPrio: Telemetry-Aware Dispatch Ordering
//!
//! A queue-sort plugin for cluster schedulers. Pending workloads are ordered by
//! their declared context tier, demoted when cached node telemetry shows their
//! placement over its congestion budget, with FIFO order among equals. The
//! comparator never performs network I/O; a background task keeps the
//! telemetry cache fresh.

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod plugin;
pub mod queue;
pub mod telemetry;

pub use error::{PrioError, TelemetryError};
pub use plugin::{ContextPrio, QueueSortPlugin};
