//! Threshold tables: classify a continuous metric value onto a tier.

use crate::classify::ContextTier;
use crate::error::PrioError;
use serde::{Deserialize, Serialize};

/// One row of a threshold table: values at or above `lower_bound` map to `tier`
/// until the next row's bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEntry {
    pub lower_bound: f64,
    pub tier: ContextTier,
}

impl ThresholdEntry {
    pub fn new(lower_bound: f64, tier: ContextTier) -> Self {
        Self { lower_bound, tier }
    }
}

/// Immutable, ascending threshold table.
///
/// Bounds are finite and strictly increasing, tiers are non-decreasing, so
/// [`ThresholdTable::classify`] is monotonic in its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ThresholdEntry>", into = "Vec<ThresholdEntry>")]
pub struct ThresholdTable {
    entries: Vec<ThresholdEntry>,
}

impl ThresholdTable {
    /// Build a table, rejecting empty, non-finite, unsorted, or tier-decreasing rows.
    pub fn new(entries: Vec<ThresholdEntry>) -> Result<Self, PrioError> {
        if entries.is_empty() {
            return Err(PrioError::ConfigInvalid(
                "threshold table must contain at least one entry".to_string(),
            ));
        }
        for entry in &entries {
            if !entry.lower_bound.is_finite() {
                return Err(PrioError::ConfigInvalid(format!(
                    "threshold bound {} is not finite",
                    entry.lower_bound
                )));
            }
        }
        for pair in entries.windows(2) {
            if pair[1].lower_bound <= pair[0].lower_bound {
                return Err(PrioError::ConfigInvalid(format!(
                    "threshold bounds must be strictly increasing ({} then {})",
                    pair[0].lower_bound, pair[1].lower_bound
                )));
            }
            if pair[1].tier < pair[0].tier {
                return Err(PrioError::ConfigInvalid(format!(
                    "threshold tiers must not decrease ({} at {} then {} at {})",
                    pair[0].tier, pair[0].lower_bound, pair[1].tier, pair[1].lower_bound
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Tier of the greatest bound `<= value`; `Lowest` below the smallest bound
    /// and for NaN.
    pub fn classify(&self, value: f64) -> ContextTier {
        let idx = self.entries.partition_point(|e| e.lower_bound <= value);
        match idx {
            0 => ContextTier::Lowest,
            i => self.entries[i - 1].tier,
        }
    }

    pub fn entries(&self) -> &[ThresholdEntry] {
        &self.entries
    }
}

impl Default for ThresholdTable {
    /// Placement map: 10 -> Lowest, 50 -> Low, 80 -> High.
    fn default() -> Self {
        Self {
            entries: vec![
                ThresholdEntry::new(10.0, ContextTier::Lowest),
                ThresholdEntry::new(50.0, ContextTier::Low),
                ThresholdEntry::new(80.0, ContextTier::High),
            ],
        }
    }
}

impl TryFrom<Vec<ThresholdEntry>> for ThresholdTable {
    type Error = PrioError;

    fn try_from(entries: Vec<ThresholdEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<ThresholdTable> for Vec<ThresholdEntry> {
    fn from(table: ThresholdTable) -> Self {
        table.entries
    }
}
