//! Shared telemetry types: metric kinds and samples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Node metric sampled from the monitoring backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Bytes received on the configured interface over the lookback window.
    Bandwidth,
    /// Memory utilization percentage (0-100).
    MemoryUtilization,
    /// 1-minute load average.
    Load1m,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [
        MetricKind::Bandwidth,
        MetricKind::MemoryUtilization,
        MetricKind::Load1m,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Bandwidth => "bandwidth",
            MetricKind::MemoryUtilization => "memory_utilization",
            MetricKind::Load1m => "load1m",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown metric kind '{}' (expected bandwidth, memory_utilization, or load1m)",
                    s
                )
            })
    }
}

/// A single measured value for one metric on one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub node: String,
    pub kind: MetricKind,
    pub value: f64,
    pub observed_at: DateTime<Utc>,
}
