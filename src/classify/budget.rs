//! Per-tier congestion budgets.
//!
//! A budget is the telemetry level beyond which a tier's expected capacity is
//! considered exceeded. Budgets come from configuration; a tier without one is
//! never demoted.

use crate::classify::ContextTier;
use crate::telemetry::MetricKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One budget per tier. `None` means no ceiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TierBudgets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lowest: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest: Option<f64>,
}

impl TierBudgets {
    pub fn get(&self, tier: ContextTier) -> Option<f64> {
        match tier {
            ContextTier::Lowest => self.lowest,
            ContextTier::Low => self.low,
            ContextTier::High => self.high,
            ContextTier::Highest => self.highest,
        }
    }

    pub fn with(mut self, tier: ContextTier, budget: f64) -> Self {
        let slot = match tier {
            ContextTier::Lowest => &mut self.lowest,
            ContextTier::Low => &mut self.low,
            ContextTier::High => &mut self.high,
            ContextTier::Highest => &mut self.highest,
        };
        *slot = Some(budget);
        self
    }

    fn is_empty(&self) -> bool {
        ContextTier::ALL.iter().all(|t| self.get(*t).is_none())
    }

    fn validate(&self, scope: &str) -> Result<(), String> {
        for tier in ContextTier::ALL {
            if let Some(budget) = self.get(tier) {
                if !budget.is_finite() || budget < 0.0 {
                    return Err(format!(
                        "{} budget for tier {} must be a finite, non-negative number (got {})",
                        scope, tier, budget
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Budgets applied by the comparator: a default set plus optional per-metric
/// overrides (metric units differ, so e.g. load may need its own ceilings).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CongestionBudgets {
    #[serde(flatten)]
    pub default: TierBudgets,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<MetricKind, TierBudgets>,
}

impl CongestionBudgets {
    pub fn new(default: TierBudgets) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, kind: MetricKind, budgets: TierBudgets) -> Self {
        self.overrides.insert(kind, budgets);
        self
    }

    /// Budget for `tier` when judging a `kind` sample. An override only
    /// replaces the tiers it sets.
    pub fn budget_for(&self, tier: ContextTier, kind: MetricKind) -> Option<f64> {
        self.overrides
            .get(&kind)
            .and_then(|o| o.get(tier))
            .or_else(|| self.default.get(tier))
    }

    /// Whether `value` of metric `kind` exceeds the budget for `tier`.
    pub fn exceeded(&self, tier: ContextTier, kind: MetricKind, value: f64) -> bool {
        match self.budget_for(tier, kind) {
            Some(budget) => value > budget,
            None => false,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.default.validate("default")?;
        for (kind, budgets) in &self.overrides {
            budgets.validate(kind.as_str())?;
        }
        if self.default.is_empty() && self.overrides.values().all(TierBudgets::is_empty) {
            return Err("at least one tier budget must be configured".to_string());
        }
        Ok(())
    }
}
