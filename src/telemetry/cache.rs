//! Telemetry Cache
//!
//! In-memory store of the latest sample per (node, metric), refreshed in the
//! background. Reads never perform I/O: they take a short read guard, check the
//! entry's freshness against its TTL, and return. A failed refresh keeps the
//! previous entry, which then stops being served once it ages past the TTL.

use crate::error::TelemetryError;
use crate::telemetry::{MetricKind, TelemetryClient, TelemetrySample};
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Identity of a cached series
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub node: String,
    pub kind: MetricKind,
}

impl CacheKey {
    pub fn new(node: &str, kind: MetricKind) -> Self {
        Self {
            node: node.to_string(),
            kind,
        }
    }
}

/// Cached sample with its fetch time
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub sample: TelemetrySample,
    pub fetched_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    /// Fresh iff `now - fetched_at <= ttl`.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) <= self.ttl
    }
}

/// Outcome counts of one refresh round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Pairs fetched and stored
    pub refreshed: usize,
    /// Pairs whose fetch failed (previous entry kept)
    pub failed: usize,
    /// Pairs skipped because a fetch was already in flight
    pub coalesced: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairOutcome {
    Refreshed,
    Failed,
    Coalesced,
}

/// Releases an in-flight claim when dropped.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<CacheKey>>,
    key: CacheKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.key);
    }
}

/// Concurrency-safe telemetry cache
pub struct TelemetryCache {
    /// node -> metric -> latest entry
    entries: RwLock<HashMap<String, HashMap<MetricKind, CacheEntry>>>,
    /// Pairs with a fetch currently outstanding
    in_flight: Mutex<HashSet<CacheKey>>,
    ttl: Duration,
}

impl TelemetryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh sample for `(node, kind)`, if any.
    pub fn get(&self, kind: MetricKind, node: &str) -> Option<TelemetrySample> {
        self.get_at(kind, node, Instant::now())
    }

    /// Fresh sample for `(node, kind)` as of `now`.
    pub fn get_at(&self, kind: MetricKind, node: &str, now: Instant) -> Option<TelemetrySample> {
        let entries = self.entries.read();
        entries
            .get(node)
            .and_then(|series| series.get(&kind))
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.sample.clone())
    }

    /// All fresh values for `node` as of `now`, in metric order.
    pub fn fresh_values_at(&self, node: &str, now: Instant) -> Vec<(MetricKind, f64)> {
        let entries = self.entries.read();
        let Some(series) = entries.get(node) else {
            return Vec::new();
        };
        MetricKind::ALL
            .into_iter()
            .filter_map(|kind| {
                series
                    .get(&kind)
                    .filter(|entry| entry.is_fresh(now))
                    .map(|entry| (kind, entry.sample.value))
            })
            .collect()
    }

    /// Whether an entry exists for `(node, kind)`, fresh or not.
    pub fn contains(&self, kind: MetricKind, node: &str) -> bool {
        self.entries
            .read()
            .get(node)
            .map_or(false, |series| series.contains_key(&kind))
    }

    /// Store `sample` as fetched now.
    pub fn record(&self, sample: TelemetrySample) {
        self.record_at(sample, Instant::now());
    }

    /// Store `sample` as fetched at `fetched_at`.
    pub fn record_at(&self, sample: TelemetrySample, fetched_at: Instant) {
        let entry = CacheEntry {
            fetched_at,
            ttl: self.ttl,
            sample,
        };
        let mut entries = self.entries.write();
        entries
            .entry(entry.sample.node.clone())
            .or_default()
            .insert(entry.sample.kind, entry);
    }

    /// Fresh samples, ordered by node then metric.
    pub fn snapshot(&self) -> Vec<TelemetrySample> {
        let now = Instant::now();
        let entries = self.entries.read();
        let mut samples: Vec<TelemetrySample> = entries
            .values()
            .flat_map(|series| series.values())
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.sample.clone())
            .collect();
        samples.sort_by(|a, b| a.node.cmp(&b.node).then(a.kind.cmp(&b.kind)));
        samples
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn prune(&self) -> usize {
        self.prune_at(Instant::now())
    }

    pub fn prune_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.write();
        let mut removed = 0;
        entries.retain(|_, series| {
            let before = series.len();
            series.retain(|_, entry| entry.is_fresh(now));
            removed += before - series.len();
            !series.is_empty()
        });
        removed
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn try_claim(&self, key: CacheKey) -> Option<InFlightGuard<'_>> {
        let mut in_flight = self.in_flight.lock();
        if !in_flight.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            in_flight: &self.in_flight,
            key,
        })
    }

    /// Fetch every metric for every node in `nodes` concurrently.
    ///
    /// Failures are isolated per pair, and a pair that already has a fetch in
    /// flight is skipped rather than queried twice.
    pub async fn refresh(&self, client: &TelemetryClient, nodes: &[String]) -> RefreshReport {
        let unique: BTreeSet<&str> = nodes
            .iter()
            .map(String::as_str)
            .filter(|n| !n.trim().is_empty())
            .collect();

        let outcomes = join_all(unique.iter().flat_map(|node| {
            MetricKind::ALL
                .into_iter()
                .map(move |kind| self.refresh_pair(client, node, kind))
        }))
        .await;

        let mut report = RefreshReport::default();
        for outcome in outcomes {
            match outcome {
                PairOutcome::Refreshed => report.refreshed += 1,
                PairOutcome::Failed => report.failed += 1,
                PairOutcome::Coalesced => report.coalesced += 1,
            }
        }
        debug!(
            nodes = unique.len(),
            refreshed = report.refreshed,
            failed = report.failed,
            coalesced = report.coalesced,
            "Telemetry refresh round finished"
        );
        report
    }

    /// Fetch one `(node, kind)` pair under its in-flight claim, recording a
    /// success before the claim is released.
    ///
    /// Returns `None` without touching the backend when another fetch for the
    /// same pair is outstanding.
    pub async fn fetch_pair(
        &self,
        client: &TelemetryClient,
        node: &str,
        kind: MetricKind,
    ) -> Option<Result<TelemetrySample, TelemetryError>> {
        let Some(_claim) = self.try_claim(CacheKey::new(node, kind)) else {
            debug!(node = %node, metric = %kind, "Fetch already in flight, coalescing");
            return None;
        };

        let result = client.fetch(kind, node).await;
        if let Ok(sample) = &result {
            self.record(sample.clone());
        }
        Some(result)
    }

    async fn refresh_pair(&self, client: &TelemetryClient, node: &str, kind: MetricKind) -> PairOutcome {
        match self.fetch_pair(client, node, kind).await {
            None => PairOutcome::Coalesced,
            Some(Ok(_)) => PairOutcome::Refreshed,
            Some(Err(err)) => {
                warn!(
                    node = %node,
                    metric = %kind,
                    error = %err,
                    retained = self.contains(kind, node),
                    "Telemetry fetch failed, keeping previous entry"
                );
                PairOutcome::Failed
            }
        }
    }
}
