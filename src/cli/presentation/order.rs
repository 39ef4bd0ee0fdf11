//! Order command presentation: the dispatch order with each workload's priority.

use crate::classify::ContextTier;
use crate::error::PrioError;
use crate::queue::{EffectivePriority, PendingWorkload};
use chrono::{DateTime, Utc};
use comfy_table::Table;
use serde::Serialize;

/// One workload in dispatch order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchRow {
    pub position: usize,
    pub id: String,
    pub declared: ContextTier,
    pub adjustment: i64,
    pub effective: ContextTier,
    pub enqueued_at: DateTime<Utc>,
}

impl DispatchRow {
    pub fn new(position: usize, workload: &PendingWorkload, priority: EffectivePriority) -> Self {
        Self {
            position,
            id: workload.id.to_string(),
            declared: priority.declared,
            adjustment: priority.adjustment,
            effective: priority.effective,
            enqueued_at: workload.enqueued_at,
        }
    }
}

pub fn format_dispatch_order(rows: &[DispatchRow], format: &str) -> Result<String, PrioError> {
    if format == "json" {
        return Ok(serde_json::to_string_pretty(rows)?);
    }
    if rows.is_empty() {
        return Ok("No pending workloads.".to_string());
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["#", "Workload", "Declared", "Adjustment", "Effective", "Enqueued At"]);
    for row in rows {
        table.add_row(vec![
            row.position.to_string(),
            row.id.clone(),
            row.declared.to_string(),
            row.adjustment.to_string(),
            row.effective.to_string(),
            row.enqueued_at.to_rfc3339(),
        ]);
    }
    Ok(table.to_string())
}
