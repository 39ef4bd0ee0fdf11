//! Configuration System
//!
//! Typed configuration for the plugin: backend connection, congestion budgets,
//! threshold table, refresh cadence, and logging. Loaded hierarchically through
//! [`ConfigLoader`] and validated as a whole before anything is constructed.

use crate::classify::{CongestionBudgets, ThresholdTable};
use crate::error::PrioError;
use crate::logging::LoggingConfig;
use crate::queue::DEFAULT_CONTEXT_ANNOTATION;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPrioConfig {
    /// Annotation key holding a workload's declared context label
    #[serde(default = "default_context_annotation")]
    pub context_annotation: String,

    /// Monitoring backend connection
    pub backend: BackendConfig,

    /// Per-tier congestion budgets
    pub budgets: CongestionBudgets,

    /// Value-to-tier placement map
    #[serde(default)]
    pub thresholds: ThresholdTable,

    /// Background refresh settings
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_context_annotation() -> String {
    DEFAULT_CONTEXT_ANNOTATION.to_string()
}

/// Monitoring backend connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the Prometheus-compatible HTTP API
    pub address: String,
    /// Interface label used by the bandwidth query
    pub network_interface: String,
    /// Lookback window for windowed queries; also the cache TTL
    pub time_range_minutes: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl BackendConfig {
    pub fn new(address: impl Into<String>, network_interface: impl Into<String>, time_range_minutes: u64) -> Self {
        Self {
            address: address.into(),
            network_interface: network_interface.into(),
            time_range_minutes,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    pub fn lookback_window(&self) -> Duration {
        Duration::from_secs(self.time_range_minutes.saturating_mul(60))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.address)
            .map_err(|e| format!("address '{}' is not a valid URL: {}", self.address, e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!(
                "address '{}' must use http or https, got '{}'",
                self.address,
                url.scheme()
            ));
        }
        if self.network_interface.trim().is_empty() {
            return Err("network_interface cannot be empty".to_string());
        }
        if self.time_range_minutes == 0 {
            return Err("time_range_minutes must be greater than zero".to_string());
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err("timeouts must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Background refresh settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Nodes tracked from startup
    #[serde(default)]
    pub nodes: Vec<String>,
}

fn default_interval_secs() -> u64 {
    30
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            nodes: Vec::new(),
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    fn validate(&self, window: Duration) -> Result<(), String> {
        if self.interval_secs == 0 {
            return Err("interval_secs must be greater than zero".to_string());
        }
        if self.interval() > window {
            return Err(format!(
                "interval_secs ({}) must not exceed the lookback window ({}s)",
                self.interval_secs,
                window.as_secs()
            ));
        }
        if self.nodes.iter().any(|n| n.trim().is_empty()) {
            return Err("nodes cannot contain empty identifiers".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Backend(String),
    Budgets(String),
    Refresh(String),
    Annotation(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Backend(msg) => write!(f, "Backend: {}", msg),
            ValidationError::Budgets(msg) => write!(f, "Budgets: {}", msg),
            ValidationError::Refresh(msg) => write!(f, "Refresh: {}", msg),
            ValidationError::Annotation(msg) => write!(f, "Context annotation: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ContextPrioConfig {
    /// Configuration with defaults for everything but the backend and budgets.
    pub fn new(backend: BackendConfig, budgets: CongestionBudgets) -> Self {
        Self {
            context_annotation: default_context_annotation(),
            backend,
            budgets,
            thresholds: ThresholdTable::default(),
            refresh: RefreshConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate the entire configuration, reporting every violation.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.backend.validate() {
            errors.push(ValidationError::Backend(e));
        }

        if let Err(e) = self.budgets.validate() {
            errors.push(ValidationError::Budgets(e));
        }

        if self.backend.time_range_minutes > 0 {
            if let Err(e) = self.refresh.validate(self.backend.lookback_window()) {
                errors.push(ValidationError::Refresh(e));
            }
        }

        if self.context_annotation.trim().is_empty() {
            errors.push(ValidationError::Annotation(
                "annotation key cannot be empty".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            errors.push(ValidationError::Logging(format!(
                "format '{}' must be 'text' or 'json'",
                self.logging.format
            )));
        }
        if !matches!(self.logging.output.as_str(), "stdout" | "stderr" | "file") {
            errors.push(ValidationError::Logging(format!(
                "output '{}' must be 'stdout', 'stderr', or 'file'",
                self.logging.output
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// [`Self::validate`], folded into a single construction error.
    pub fn ensure_valid(&self) -> Result<(), PrioError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            PrioError::ConfigInvalid(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    /// Render as TOML, the format the loader reads.
    pub fn to_toml(&self) -> Result<String, PrioError> {
        toml::to_string_pretty(self).map_err(|e| PrioError::Serialization(e.to_string()))
    }
}
