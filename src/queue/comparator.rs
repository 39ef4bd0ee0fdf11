//! Priority Comparator
//!
//! Orders pending workloads for dispatch. The declared context tier is demoted
//! by one when cached telemetry shows the workload's placement over its tier's
//! congestion budget. Ties fall back to FIFO on enqueue time, then to the
//! workload id. Only fresh cache entries are consulted and nothing here awaits,
//! so a missing or stale sample simply means "no congestion".

use crate::classify::{classify_label, CongestionBudgets, ContextTier};
use crate::queue::workload::{PendingWorkload, WorkloadId};
use crate::telemetry::{MetricKind, TelemetryCache};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

/// Annotation key carrying the declared context label
pub const DEFAULT_CONTEXT_ANNOTATION: &str = "v2x.context";

/// Effective priority derived for one comparison. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectivePriority {
    pub declared: ContextTier,
    /// 0 or -1
    pub adjustment: i64,
    pub effective: ContextTier,
}

/// Sort key computed once per workload
#[derive(Debug, Clone, PartialEq, Eq)]
struct DispatchKey {
    effective: ContextTier,
    enqueued_at: DateTime<Utc>,
    id: WorkloadId,
}

impl Ord for DispatchKey {
    /// `Less` dispatches first: higher tier, then older, then smaller id.
    fn cmp(&self, other: &Self) -> Ordering {
        match self.effective.cmp(&other.effective) {
            Ordering::Equal => {}
            ordering => return ordering.reverse(),
        }
        self.enqueued_at
            .cmp(&other.enqueued_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for DispatchKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Telemetry-aware comparator over pending workloads
#[derive(Clone)]
pub struct PriorityComparator {
    cache: Arc<TelemetryCache>,
    budgets: Arc<CongestionBudgets>,
    annotation_key: String,
}

impl PriorityComparator {
    pub fn new(
        cache: Arc<TelemetryCache>,
        budgets: Arc<CongestionBudgets>,
        annotation_key: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            budgets,
            annotation_key: annotation_key.into(),
        }
    }

    pub fn annotation_key(&self) -> &str {
        &self.annotation_key
    }

    pub fn budgets(&self) -> &CongestionBudgets {
        &self.budgets
    }

    pub fn effective_priority(&self, workload: &PendingWorkload) -> EffectivePriority {
        self.effective_priority_at(workload, Instant::now())
    }

    /// Effective priority of `workload` judged against cache state at `now`.
    pub fn effective_priority_at(&self, workload: &PendingWorkload, now: Instant) -> EffectivePriority {
        let declared = classify_label(workload.annotation(&self.annotation_key));
        let congested = self.congested_sample(workload, declared, now);
        let adjustment = if congested.is_some() { -1 } else { 0 };
        let effective = declared.shifted(adjustment);

        if let Some((node, kind, value)) = congested {
            trace!(
                workload = %workload.id,
                node = %node,
                metric = %kind,
                value,
                budget = ?self.budgets.budget_for(declared, kind),
                declared = %declared,
                effective = %effective,
                "Demoting congested workload"
            );
        }

        EffectivePriority {
            declared,
            adjustment,
            effective,
        }
    }

    /// First fresh sample on the workload's placement that is over budget.
    fn congested_sample<'w>(
        &self,
        workload: &'w PendingWorkload,
        declared: ContextTier,
        now: Instant,
    ) -> Option<(&'w str, MetricKind, f64)> {
        workload.placement.nodes().iter().find_map(|node| {
            self.cache
                .fresh_values_at(node, now)
                .into_iter()
                .find(|(kind, value)| self.budgets.exceeded(declared, *kind, *value))
                .map(|(kind, value)| (node.as_str(), kind, value))
        })
    }

    fn dispatch_key(&self, workload: &PendingWorkload, now: Instant) -> DispatchKey {
        DispatchKey {
            effective: self.effective_priority_at(workload, now).effective,
            enqueued_at: workload.enqueued_at,
            id: workload.id.clone(),
        }
    }

    /// `Ordering::Less` means `a` is dispatched before `b`.
    pub fn compare(&self, a: &PendingWorkload, b: &PendingWorkload) -> Ordering {
        self.compare_at(a, b, Instant::now())
    }

    pub fn compare_at(&self, a: &PendingWorkload, b: &PendingWorkload, now: Instant) -> Ordering {
        let ordering = self.dispatch_key(a, now).cmp(&self.dispatch_key(b, now));
        trace!(a = %a.id, b = %b.id, ordering = ?ordering, "Compared workloads");
        ordering
    }

    /// Whether `a` should be dispatched strictly before `b`.
    pub fn less(&self, a: &PendingWorkload, b: &PendingWorkload) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    pub fn less_at(&self, a: &PendingWorkload, b: &PendingWorkload, now: Instant) -> bool {
        self.compare_at(a, b, now) == Ordering::Less
    }

    /// Sort `workloads` into dispatch order, using one cache view for the whole sort.
    pub fn sort_pending(&self, workloads: &mut [PendingWorkload]) {
        self.sort_pending_at(workloads, Instant::now());
    }

    pub fn sort_pending_at(&self, workloads: &mut [PendingWorkload], now: Instant) {
        workloads.sort_by_cached_key(|w| self.dispatch_key(w, now));
    }
}
