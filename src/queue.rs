//! Pending workload model and the dispatch-order comparator.

pub mod comparator;
pub mod workload;

pub use comparator::{EffectivePriority, PriorityComparator, DEFAULT_CONTEXT_ANNOTATION};
pub use workload::{PendingWorkload, Placement, WorkloadId};
