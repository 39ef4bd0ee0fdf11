//! Context tiers and declared-label classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority tier a workload can occupy. Higher rank is dispatched first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ContextTier {
    #[default]
    Lowest = 0,
    Low = 1,
    High = 2,
    Highest = 3,
}

impl ContextTier {
    pub const ALL: [ContextTier; 4] = [
        ContextTier::Lowest,
        ContextTier::Low,
        ContextTier::High,
        ContextTier::Highest,
    ];

    pub fn rank(self) -> i64 {
        self as i64
    }

    /// Tier for `rank`, clamped into `Lowest..=Highest`.
    pub fn from_rank_clamped(rank: i64) -> Self {
        match rank {
            i64::MIN..=0 => ContextTier::Lowest,
            1 => ContextTier::Low,
            2 => ContextTier::High,
            _ => ContextTier::Highest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContextTier::Lowest => "Lowest",
            ContextTier::Low => "Low",
            ContextTier::High => "High",
            ContextTier::Highest => "Highest",
        }
    }

    /// Shift by `delta` tiers, saturating at both ends.
    pub fn shifted(self, delta: i64) -> Self {
        Self::from_rank_clamped(self.rank().saturating_add(delta))
    }
}

impl fmt::Display for ContextTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a declared context label onto its tier.
///
/// Matching is exact and case-sensitive. Absent, empty, or unrecognized labels
/// are a valid state and map to [`ContextTier::Lowest`].
pub fn classify_label(label: Option<&str>) -> ContextTier {
    match label {
        Some("Lowest") => ContextTier::Lowest,
        Some("Low") => ContextTier::Low,
        Some("High") => ContextTier::High,
        Some("Highest") => ContextTier::Highest,
        _ => ContextTier::Lowest,
    }
}
