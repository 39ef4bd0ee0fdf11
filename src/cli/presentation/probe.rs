//! Probe command presentation: per-metric samples and their placement tier.

use crate::classify::{ContextTier, ThresholdTable};
use crate::error::{PrioError, TelemetryError};
use crate::telemetry::{MetricKind, TelemetrySample};
use chrono::{DateTime, Utc};
use comfy_table::Table;
use serde::Serialize;

/// One probed metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeRow {
    pub metric: MetricKind,
    pub value: Option<f64>,
    pub tier: Option<ContextTier>,
    pub observed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl ProbeRow {
    pub fn from_result(
        kind: MetricKind,
        result: &Result<TelemetrySample, TelemetryError>,
        thresholds: &ThresholdTable,
    ) -> Self {
        match result {
            Ok(sample) => Self {
                metric: kind,
                value: Some(sample.value),
                tier: Some(thresholds.classify(sample.value)),
                observed_at: Some(sample.observed_at),
                error: None,
            },
            Err(e) => Self {
                metric: kind,
                value: None,
                tier: None,
                observed_at: None,
                error: Some(e.to_string()),
            },
        }
    }
}

pub fn format_probe_result(node: &str, rows: &[ProbeRow], format: &str) -> Result<String, PrioError> {
    if format == "json" {
        let out = serde_json::json!({ "node": node, "samples": rows });
        return Ok(serde_json::to_string_pretty(&out)?);
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Metric", "Value", "Tier", "Observed At", "Error"]);
    for row in rows {
        table.add_row(vec![
            row.metric.to_string(),
            row.value.map_or("-".to_string(), |v| format!("{:.3}", v)),
            row.tier.map_or("-".to_string(), |t| t.to_string()),
            row.observed_at
                .map_or("-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            row.error.clone().unwrap_or_default(),
        ]);
    }
    Ok(format!("Node: {}\n{}", node, table))
}
