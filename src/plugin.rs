//! Queue-sort plugin facade.
//!
//! [`ContextPrio`] wires configuration into the telemetry backend, client,
//! cache, refresh task, and comparator, and exposes the host-facing
//! [`QueueSortPlugin`] contract.

use crate::classify::{ContextTier, ThresholdTable};
use crate::config::ContextPrioConfig;
use crate::error::{PrioError, TelemetryError};
use crate::queue::{EffectivePriority, PendingWorkload, PriorityComparator};
use crate::telemetry::{
    MetricKind, MetricsBackend, PrometheusBackend, RefreshHandle, RefreshReport, RefreshTask,
    TelemetryCache, TelemetryClient, TelemetrySample, TrackedNodes,
};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Host scheduler contract for queue ordering plugins
pub trait QueueSortPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Whether `a` should be dispatched before `b`.
    fn less(&self, a: &PendingWorkload, b: &PendingWorkload) -> bool;
}

/// Telemetry-aware context priority plugin
pub struct ContextPrio {
    comparator: PriorityComparator,
    cache: Arc<TelemetryCache>,
    client: Arc<TelemetryClient>,
    thresholds: Arc<ThresholdTable>,
    tracked: TrackedNodes,
    refresh_interval: Duration,
    refresh: Mutex<Option<RefreshHandle>>,
}

impl ContextPrio {
    pub const NAME: &'static str = "ContextPrio";

    /// Validate `config` and build the plugin against a Prometheus backend.
    pub fn new(config: &ContextPrioConfig) -> Result<Self, PrioError> {
        config.ensure_valid()?;
        let backend = PrometheusBackend::new(
            &config.backend.address,
            config.backend.connect_timeout(),
            config.backend.request_timeout(),
        )?;
        Self::with_backend(config, Arc::new(backend))
    }

    /// Validate `config` and build the plugin over an arbitrary backend.
    pub fn with_backend(
        config: &ContextPrioConfig,
        backend: Arc<dyn MetricsBackend>,
    ) -> Result<Self, PrioError> {
        config.ensure_valid()?;

        let window = config.backend.lookback_window();
        let client = Arc::new(TelemetryClient::new(
            backend,
            config.backend.network_interface.clone(),
            window,
        ));
        let cache = Arc::new(TelemetryCache::new(window));
        let comparator = PriorityComparator::new(
            cache.clone(),
            Arc::new(config.budgets.clone()),
            config.context_annotation.clone(),
        );
        let tracked: TrackedNodes = Arc::new(RwLock::new(
            config.refresh.nodes.iter().cloned().collect::<BTreeSet<_>>(),
        ));

        info!(
            backend = %client.backend_address(),
            network_interface = %config.backend.network_interface,
            time_range_minutes = config.backend.time_range_minutes,
            refresh_interval_secs = config.refresh.interval_secs,
            context_annotation = %config.context_annotation,
            tracked_nodes = tracked.read().len(),
            "ContextPrio plugin constructed"
        );

        Ok(Self {
            comparator,
            cache,
            client,
            thresholds: Arc::new(config.thresholds.clone()),
            tracked,
            refresh_interval: config.refresh.interval(),
            refresh: Mutex::new(None),
        })
    }

    /// Start the background refresh task. A no-op if it is already running.
    ///
    /// Must be called within a tokio runtime.
    pub fn start_refresh(&self) {
        let mut refresh = self.refresh.lock();
        if refresh.as_ref().map_or(false, |h| !h.is_finished()) {
            return;
        }
        *refresh = Some(RefreshTask::spawn(
            self.cache.clone(),
            self.client.clone(),
            self.tracked.clone(),
            self.refresh_interval,
        ));
    }

    /// Stop the background refresh task, waiting for an in-flight round.
    pub async fn stop_refresh(&self) {
        let handle = self.refresh.lock().take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh
            .lock()
            .as_ref()
            .map_or(false, |h| !h.is_finished())
    }

    /// Run one refresh round over the tracked nodes now.
    pub async fn refresh_now(&self) -> RefreshReport {
        let nodes = self.tracked_nodes();
        self.cache.refresh(&self.client, &nodes).await
    }

    /// Run one refresh round over `nodes`, tracked or not.
    pub async fn refresh_nodes(&self, nodes: &[String]) -> RefreshReport {
        self.cache.refresh(&self.client, nodes).await
    }

    /// Fetch `kinds` for `node` from the backend now, recording successes in
    /// the cache. Errors are returned per metric. A metric whose fetch is
    /// already in flight (e.g. in a refresh round) is not queried again and
    /// reports [`TelemetryError::FetchInFlight`].
    pub async fn probe(
        &self,
        node: &str,
        kinds: &[MetricKind],
    ) -> Vec<(MetricKind, Result<TelemetrySample, TelemetryError>)> {
        let mut results = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            let result = self
                .cache
                .fetch_pair(&self.client, node, kind)
                .await
                .unwrap_or_else(|| {
                    Err(TelemetryError::FetchInFlight {
                        node: node.to_string(),
                        kind,
                    })
                });
            results.push((kind, result));
        }
        results
    }

    /// Add `node` to the refresh set. Returns false if already tracked.
    pub fn track_node(&self, node: impl Into<String>) -> bool {
        let node = node.into();
        if node.trim().is_empty() {
            return false;
        }
        self.tracked.write().insert(node)
    }

    /// Remove `node` from the refresh set. Its cached entries age out by TTL.
    pub fn untrack_node(&self, node: &str) -> bool {
        self.tracked.write().remove(node)
    }

    pub fn tracked_nodes(&self) -> Vec<String> {
        self.tracked.read().iter().cloned().collect()
    }

    /// Placement tier of `node` from its fresh bandwidth sample, if any.
    pub fn node_placement_tier(&self, node: &str) -> Option<ContextTier> {
        self.cache
            .get(MetricKind::Bandwidth, node)
            .map(|sample| self.thresholds.classify(sample.value))
    }

    pub fn effective_priority(&self, workload: &PendingWorkload) -> EffectivePriority {
        self.comparator.effective_priority(workload)
    }

    pub fn effective_priority_at(&self, workload: &PendingWorkload, now: Instant) -> EffectivePriority {
        self.comparator.effective_priority_at(workload, now)
    }

    /// Sort `workloads` into dispatch order.
    pub fn sort_pending(&self, workloads: &mut [PendingWorkload]) {
        self.comparator.sort_pending(workloads);
    }

    /// Sort `workloads` against cache state at `now`. Pair with
    /// [`ContextPrio::effective_priority_at`] to report the tiers the sort used.
    pub fn sort_pending_at(&self, workloads: &mut [PendingWorkload], now: Instant) {
        self.comparator.sort_pending_at(workloads, now);
    }

    pub fn comparator(&self) -> &PriorityComparator {
        &self.comparator
    }

    pub fn cache(&self) -> &Arc<TelemetryCache> {
        &self.cache
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }
}

impl QueueSortPlugin for ContextPrio {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn less(&self, a: &PendingWorkload, b: &PendingWorkload) -> bool {
        self.comparator.less(a, b)
    }
}
