//! PromQL templates for node metrics.

use crate::telemetry::MetricKind;
use std::time::Duration;

/// Build the instant query for `kind` on `node`.
///
/// `network_interface` and `window` only affect the bandwidth query.
pub fn build_query(kind: MetricKind, node: &str, network_interface: &str, window: Duration) -> String {
    let node = escape_label_value(node);
    match kind {
        MetricKind::Bandwidth => format!(
            "sum_over_time(node_network_receive_bytes_total{{node=\"{}\",device=\"{}\"}}[{}])",
            node,
            escape_label_value(network_interface),
            window_string(window)
        ),
        MetricKind::MemoryUtilization => format!(
            "100 - (avg(node_memory_MemAvailable_bytes{{node=\"{0}\"}}) / avg(node_memory_MemTotal_bytes{{node=\"{0}\"}}) * 100)",
            node
        ),
        MetricKind::Load1m => format!("node_load1{{node=\"{}\"}}", node),
    }
}

/// Render a range-vector duration: whole minutes as `5m`, otherwise seconds.
pub fn window_string(window: Duration) -> String {
    let secs = window.as_secs().max(1);
    if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

fn escape_label_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
