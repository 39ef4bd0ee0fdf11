//! CLI presentation: text and json formatters per command.

mod order;
mod probe;

pub use order::{format_dispatch_order, DispatchRow};
pub use probe::{format_probe_result, ProbeRow};
