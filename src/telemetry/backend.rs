//! Monitoring backend abstraction
//!
//! The telemetry client talks to a time-series backend through [`MetricsBackend`].
//! [`PrometheusBackend`] implements it over the Prometheus HTTP instant-query API
//! (`GET /api/v1/query`). Responses are decoded into an explicit tagged
//! [`QueryResult`] so callers validate the shape before using any value.

use crate::error::{PrioError, TelemetryError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// One element of an instant vector.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSample {
    pub labels: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Decoded query result, tagged by result type.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Vector(Vec<VectorSample>),
    Scalar { timestamp: DateTime<Utc>, value: f64 },
    /// Range results are never valid for instant node queries; only the
    /// series count is kept for diagnostics.
    Matrix { series: usize },
    String { timestamp: DateTime<Utc>, value: String },
}

impl QueryResult {
    pub fn result_type(&self) -> &'static str {
        match self {
            QueryResult::Vector(_) => "vector",
            QueryResult::Scalar { .. } => "scalar",
            QueryResult::Matrix { .. } => "matrix",
            QueryResult::String { .. } => "string",
        }
    }
}

/// Successful backend response: result plus any partial-response warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse {
    pub result: QueryResult,
    pub warnings: Vec<String>,
}

impl QueryResponse {
    pub fn vector(samples: Vec<VectorSample>) -> Self {
        Self {
            result: QueryResult::Vector(samples),
            warnings: Vec::new(),
        }
    }
}

/// Time-series backend capable of instant queries
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// Evaluate `query` at instant `at`.
    async fn instant_query(
        &self,
        query: &str,
        at: DateTime<Utc>,
    ) -> Result<QueryResponse, TelemetryError>;

    /// Backend address, for diagnostics
    fn address(&self) -> &str;
}

// Prometheus API envelope
#[derive(Deserialize)]
struct ApiEnvelope {
    status: String,
    #[serde(default)]
    data: Option<ApiData>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

type WirePoint = (f64, String);

#[derive(Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
enum ApiData {
    Vector(Vec<WireVectorSample>),
    Scalar(WirePoint),
    Matrix(Vec<serde_json::Value>),
    String(WirePoint),
}

#[derive(Deserialize)]
struct WireVectorSample {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    value: WirePoint,
}

fn parse_timestamp(ts: f64) -> Result<DateTime<Utc>, TelemetryError> {
    if !ts.is_finite() {
        return Err(TelemetryError::MalformedResponse(format!(
            "non-finite sample timestamp {}",
            ts
        )));
    }
    DateTime::<Utc>::from_timestamp_millis((ts * 1000.0).round() as i64).ok_or_else(|| {
        TelemetryError::MalformedResponse(format!("sample timestamp {} out of range", ts))
    })
}

fn parse_value(raw: &str) -> Result<f64, TelemetryError> {
    raw.trim().parse::<f64>().map_err(|e| {
        TelemetryError::MalformedResponse(format!("sample value '{}' is not a number: {}", raw, e))
    })
}

impl ApiData {
    fn into_result(self) -> Result<QueryResult, TelemetryError> {
        match self {
            ApiData::Vector(samples) => samples
                .into_iter()
                .map(|s| {
                    Ok(VectorSample {
                        labels: s.metric,
                        timestamp: parse_timestamp(s.value.0)?,
                        value: parse_value(&s.value.1)?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(QueryResult::Vector),
            ApiData::Scalar((ts, raw)) => Ok(QueryResult::Scalar {
                timestamp: parse_timestamp(ts)?,
                value: parse_value(&raw)?,
            }),
            ApiData::Matrix(series) => Ok(QueryResult::Matrix {
                series: series.len(),
            }),
            ApiData::String((ts, value)) => Ok(QueryResult::String {
                timestamp: parse_timestamp(ts)?,
                value,
            }),
        }
    }
}

/// Decode a Prometheus API body. `http_ok` is whether the HTTP status was 2xx.
pub fn decode_response(body: &str, http_ok: bool, status: &str) -> Result<QueryResponse, TelemetryError> {
    let envelope: ApiEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if http_ok => {
            return Err(TelemetryError::MalformedResponse(format!(
                "failed to parse response body: {}",
                e
            )))
        }
        Err(_) => {
            return Err(TelemetryError::BackendUnreachable(format!(
                "request failed with status {}",
                status
            )))
        }
    };

    if envelope.status != "success" {
        return Err(TelemetryError::QueryRejected {
            error_type: envelope.error_type.unwrap_or_else(|| "unknown".to_string()),
            message: envelope
                .error
                .unwrap_or_else(|| format!("status '{}'", envelope.status)),
        });
    }

    let data = envelope.data.ok_or_else(|| {
        TelemetryError::MalformedResponse("successful response carries no data".to_string())
    })?;

    Ok(QueryResponse {
        result: data.into_result()?,
        warnings: envelope.warnings,
    })
}

// Map transport errors onto the telemetry taxonomy
fn map_http_error(error: reqwest::Error) -> TelemetryError {
    if error.is_timeout() {
        TelemetryError::BackendUnreachable(format!("request timeout: {}", error))
    } else if error.is_connect() {
        TelemetryError::BackendUnreachable(format!("connection error: {}", error))
    } else {
        TelemetryError::BackendUnreachable(format!("HTTP error: {}", error))
    }
}

/// Prometheus HTTP API backend
pub struct PrometheusBackend {
    client: Client,
    address: String,
    query_url: Url,
}

impl PrometheusBackend {
    /// Build a backend for `address`. An unparseable address or a client build
    /// failure is a configuration error.
    pub fn new(
        address: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, PrioError> {
        let base = address.trim_end_matches('/');
        let query_url = Url::parse(&format!("{}/api/v1/query", base)).map_err(|e| {
            PrioError::ConfigInvalid(format!("invalid backend address '{}': {}", address, e))
        })?;
        let client = Client::builder()
            .no_proxy()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| PrioError::ConfigInvalid(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            address: address.to_string(),
            query_url,
        })
    }
}

#[async_trait]
impl MetricsBackend for PrometheusBackend {
    async fn instant_query(
        &self,
        query: &str,
        at: DateTime<Utc>,
    ) -> Result<QueryResponse, TelemetryError> {
        let time = format!("{:.3}", at.timestamp_millis() as f64 / 1000.0);
        let response = self
            .client
            .get(self.query_url.clone())
            .query(&[("query", query), ("time", time.as_str())])
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_http_error)?;
        decode_response(&body, status.is_success(), status.as_str())
    }

    fn address(&self) -> &str {
        &self.address
    }
}
