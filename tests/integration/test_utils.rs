//! Shared test utilities for integration tests
//!
//! Provides an in-memory monitoring backend, plugin fixtures, and serialized
//! access to the environment variables the config loader reads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contextprio::classify::{CongestionBudgets, ContextTier, TierBudgets};
use contextprio::config::{BackendConfig, ContextPrioConfig};
use contextprio::telemetry::{MetricsBackend, QueryResponse, VectorSample};
use contextprio::TelemetryError;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Global mutex to serialize HOME / XDG_CONFIG_HOME access across tests
static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Run `f` with HOME and XDG_CONFIG_HOME pointed inside `test_dir`, restoring both afterwards.
pub fn with_isolated_home<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let home = std::env::var("HOME").ok();
    let xdg = std::env::var("XDG_CONFIG_HOME").ok();

    let test_home = test_dir.path().join("home");
    std::fs::create_dir_all(&test_home).unwrap();
    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", test_home.join(".config"));

    let result = f();

    match home {
        Some(orig) => std::env::set_var("HOME", orig),
        None => std::env::remove_var("HOME"),
    }
    match xdg {
        Some(orig) => std::env::set_var("XDG_CONFIG_HOME", orig),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
    result
}

/// Budgets mirroring the default placement map: 10 / 50 / 80, Highest unbounded
pub fn placement_budgets() -> CongestionBudgets {
    CongestionBudgets::new(
        TierBudgets::default()
            .with(ContextTier::Lowest, 10.0)
            .with(ContextTier::Low, 50.0)
            .with(ContextTier::High, 80.0),
    )
}

pub fn test_config(nodes: &[&str]) -> ContextPrioConfig {
    let mut config = ContextPrioConfig::new(
        BackendConfig::new("http://127.0.0.1:9090", "eth0", 5),
        placement_budgets(),
    );
    config.refresh.nodes = nodes.iter().map(|n| n.to_string()).collect();
    config.refresh.interval_secs = 1;
    config
}

/// In-memory backend answering by node label and query family.
///
/// Each series is keyed by `(node, metric prefix)` where the prefix is the
/// first identifier in the query (`sum_over_time`, `100`, `node_load1`).
#[derive(Default)]
pub struct FakeBackend {
    series: Mutex<HashMap<(String, String), Result<Vec<f64>, TelemetryError>>>,
    calls: AtomicUsize,
}

impl FakeBackend {
    pub fn set(&self, node: &str, family: &str, values: Vec<f64>) {
        self.series
            .lock()
            .insert((node.to_string(), family.to_string()), Ok(values));
    }

    pub fn fail(&self, node: &str, family: &str, error: TelemetryError) {
        self.series
            .lock()
            .insert((node.to_string(), family.to_string()), Err(error));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub const BANDWIDTH: &str = "sum_over_time";
pub const MEMORY: &str = "100";
pub const LOAD: &str = "node_load1";

fn node_of(query: &str) -> Option<String> {
    let start = query.find("node=\"")? + "node=\"".len();
    let end = query[start..].find('"')? + start;
    Some(query[start..end].to_string())
}

fn family_of(query: &str) -> String {
    query
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .next()
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl MetricsBackend for FakeBackend {
    async fn instant_query(
        &self,
        query: &str,
        _at: DateTime<Utc>,
    ) -> Result<QueryResponse, TelemetryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let node = node_of(query).unwrap_or_default();
        let values = self
            .series
            .lock()
            .get(&(node, family_of(query)))
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))?;
        Ok(QueryResponse::vector(
            values
                .into_iter()
                .map(|value| VectorSample {
                    labels: BTreeMap::new(),
                    timestamp: Utc::now(),
                    value,
                })
                .collect(),
        ))
    }

    fn address(&self) -> &str {
        "fake://backend"
    }
}
