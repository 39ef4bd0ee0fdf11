//! Context classification: ordered tiers, threshold tables, and congestion budgets.
//! All functions here are pure and total.

mod budget;
mod threshold;
mod tier;

pub use budget::{CongestionBudgets, TierBudgets};
pub use threshold::{ThresholdEntry, ThresholdTable};
pub use tier::{classify_label, ContextTier};
