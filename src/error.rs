//! Error types for the ContextPrio queue-sort plugin.

use crate::telemetry::MetricKind;
use thiserror::Error;

/// Telemetry fetch errors.
///
/// These are contained by the telemetry cache: a failed fetch keeps the
/// previous entry until it ages out and is never surfaced to the comparator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TelemetryError {
    #[error("Monitoring backend unreachable: {0}")]
    BackendUnreachable(String),

    #[error("Invalid response for query `{query}`: expected {expected} value, got {got}")]
    ResultCardinalityMismatch {
        query: String,
        expected: usize,
        got: usize,
    },

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Query rejected by backend ({error_type}): {message}")]
    QueryRejected { error_type: String, message: String },

    #[error("Invalid telemetry request: {0}")]
    InvalidRequest(String),

    #[error("Fetch of {kind} for node {node} already in flight")]
    FetchInFlight { node: String, kind: MetricKind },
}

/// Plugin-level errors
#[derive(Debug, Error)]
pub enum PrioError {
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<config::ConfigError> for PrioError {
    fn from(err: config::ConfigError) -> Self {
        PrioError::ConfigInvalid(err.to_string())
    }
}

impl From<serde_json::Error> for PrioError {
    fn from(err: serde_json::Error) -> Self {
        PrioError::Serialization(err.to_string())
    }
}
