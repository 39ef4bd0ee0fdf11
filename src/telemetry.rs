//! Telemetry domain: backend queries, the strict client, the cache, and its refresh task.

mod types;

pub mod backend;
pub mod cache;
pub mod client;
pub mod query;
pub mod refresh;

pub use backend::{MetricsBackend, PrometheusBackend, QueryResponse, QueryResult, VectorSample};
pub use cache::{CacheEntry, CacheKey, RefreshReport, TelemetryCache};
pub use client::TelemetryClient;
pub use refresh::{RefreshHandle, RefreshTask, TrackedNodes};
pub use types::{MetricKind, TelemetrySample};
