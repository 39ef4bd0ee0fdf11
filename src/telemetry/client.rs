//! Telemetry client: one strict instant query per (metric, node).

use crate::error::TelemetryError;
use crate::telemetry::backend::{MetricsBackend, QueryResult};
use crate::telemetry::query::build_query;
use crate::telemetry::{MetricKind, TelemetrySample};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Fetches node samples from a [`MetricsBackend`].
///
/// A query succeeds only when the backend returns an instant vector with
/// exactly one element; ambiguous results are never narrowed to an arbitrary
/// sample.
pub struct TelemetryClient {
    backend: Arc<dyn MetricsBackend>,
    network_interface: String,
    window: Duration,
}

impl TelemetryClient {
    pub fn new(backend: Arc<dyn MetricsBackend>, network_interface: String, window: Duration) -> Self {
        Self {
            backend,
            network_interface,
            window,
        }
    }

    /// Lookback window used by windowed queries, also the cache TTL.
    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn network_interface(&self) -> &str {
        &self.network_interface
    }

    pub fn backend_address(&self) -> &str {
        self.backend.address()
    }

    pub fn query_for(&self, kind: MetricKind, node: &str) -> String {
        build_query(kind, node, &self.network_interface, self.window)
    }

    /// Fetch the current sample of `kind` for `node`.
    pub async fn fetch(&self, kind: MetricKind, node: &str) -> Result<TelemetrySample, TelemetryError> {
        self.fetch_at(kind, node, Utc::now()).await
    }

    /// Fetch the sample of `kind` for `node` evaluated at instant `at`.
    pub async fn fetch_at(
        &self,
        kind: MetricKind,
        node: &str,
        at: DateTime<Utc>,
    ) -> Result<TelemetrySample, TelemetryError> {
        if node.trim().is_empty() {
            return Err(TelemetryError::InvalidRequest(
                "node identifier must not be empty".to_string(),
            ));
        }

        let query = self.query_for(kind, node);
        debug!(
            node = %node,
            metric = %kind,
            query = %query,
            backend = %self.backend.address(),
            "Querying monitoring backend"
        );

        let response = self.backend.instant_query(&query, at).await?;

        if !response.warnings.is_empty() {
            warn!(
                node = %node,
                metric = %kind,
                query = %query,
                warnings = ?response.warnings,
                "Monitoring backend returned warnings"
            );
        }

        let mut samples = match response.result {
            QueryResult::Vector(samples) => samples,
            other => {
                return Err(TelemetryError::MalformedResponse(format!(
                    "expected vector result for `{}`, got {}",
                    query,
                    other.result_type()
                )))
            }
        };

        if samples.len() != 1 {
            return Err(TelemetryError::ResultCardinalityMismatch {
                query,
                expected: 1,
                got: samples.len(),
            });
        }

        let sample = samples.remove(0);
        Ok(TelemetrySample {
            node: node.to_string(),
            kind,
            value: sample.value,
            observed_at: sample.timestamp,
        })
    }
}
