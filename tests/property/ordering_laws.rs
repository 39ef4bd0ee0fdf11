//! Property-based tests for the dispatch comparator

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use contextprio::classify::{classify_label, CongestionBudgets, ContextTier, TierBudgets};
use contextprio::queue::{PendingWorkload, PriorityComparator, DEFAULT_CONTEXT_ANNOTATION};
use contextprio::telemetry::{MetricKind, TelemetryCache, TelemetrySample};
use proptest::prelude::*;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

const NODES: [&str; 3] = ["n0", "n1", "n2"];
const LABELS: [&str; 6] = ["Lowest", "Low", "High", "Highest", "", "urgent"];

fn budgets() -> CongestionBudgets {
    CongestionBudgets::new(
        TierBudgets::default()
            .with(ContextTier::Lowest, 10.0)
            .with(ContextTier::Low, 50.0)
            .with(ContextTier::High, 80.0),
    )
}

/// Small id, label, placement and enqueue domains so ties actually occur
fn workload() -> impl Strategy<Value = PendingWorkload> {
    (
        0u8..4,
        prop::option::of(0usize..LABELS.len()),
        prop::option::of(0usize..NODES.len()),
        0i64..4,
    )
        .prop_map(|(id, label, node, offset)| {
            let enqueued =
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + ChronoDuration::seconds(offset);
            let mut w = PendingWorkload::new(format!("w{}", id), enqueued);
            if let Some(label) = label {
                w = w.with_annotation(DEFAULT_CONTEXT_ANNOTATION, LABELS[label]);
            }
            if let Some(node) = node {
                w = w.on_node(NODES[node]);
            }
            w
        })
}

/// Optional bandwidth per node; None leaves the node without telemetry
fn node_telemetry() -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(prop::option::of(0.0f64..120.0), NODES.len())
}

fn comparator_with(telemetry: &[Option<f64>], now: Instant) -> PriorityComparator {
    let cache = Arc::new(TelemetryCache::new(Duration::from_secs(300)));
    for (node, value) in NODES.iter().zip(telemetry) {
        if let Some(value) = value {
            cache.record_at(
                TelemetrySample {
                    node: node.to_string(),
                    kind: MetricKind::Bandwidth,
                    value: *value,
                    observed_at: Utc::now(),
                },
                now,
            );
        }
    }
    PriorityComparator::new(cache, Arc::new(budgets()), DEFAULT_CONTEXT_ANNOTATION)
}

/// less is irreflexive, asymmetric, and transitive over a fixed snapshot
#[test]
fn test_less_is_strict_weak_ordering_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(node_telemetry(), workload(), workload(), workload()),
            |(telemetry, a, b, c)| {
                let now = Instant::now();
                let cmp = comparator_with(&telemetry, now);
                let less = |x: &PendingWorkload, y: &PendingWorkload| cmp.less_at(x, y, now);

                prop_assert!(!less(&a, &a));
                prop_assert!(!(less(&a, &b) && less(&b, &a)));
                if less(&a, &b) && less(&b, &c) {
                    prop_assert!(less(&a, &c));
                }

                // Incomparability is transitive too
                let equiv = |x: &PendingWorkload, y: &PendingWorkload| !less(x, y) && !less(y, x);
                if equiv(&a, &b) && equiv(&b, &c) {
                    prop_assert!(equiv(&a, &c));
                }
                Ok(())
            },
        )
        .unwrap();
}

/// Equal effective tiers are ordered by enqueue time
#[test]
fn test_fifo_within_tier_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(node_telemetry(), workload(), workload()),
            |(telemetry, a, b)| {
                let now = Instant::now();
                let cmp = comparator_with(&telemetry, now);
                let ea = cmp.effective_priority_at(&a, now).effective;
                let eb = cmp.effective_priority_at(&b, now).effective;
                if ea == eb && a.enqueued_at != b.enqueued_at {
                    prop_assert_eq!(cmp.less_at(&a, &b, now), a.enqueued_at < b.enqueued_at);
                }
                Ok(())
            },
        )
        .unwrap();
}

/// Without fresh telemetry the order depends only on declared tier, enqueue time, and id
#[test]
fn test_fail_open_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(node_telemetry(), workload(), workload()),
            |(telemetry, a, b)| {
                let recorded = Instant::now();
                let cmp = comparator_with(&telemetry, recorded);
                // Every recorded entry has expired by now
                let later = recorded + Duration::from_secs(301);

                let declared = |w: &PendingWorkload| {
                    classify_label(w.annotation(DEFAULT_CONTEXT_ANNOTATION))
                };
                let expected = declared(&b)
                    .cmp(&declared(&a))
                    .then(a.enqueued_at.cmp(&b.enqueued_at))
                    .then(a.id.cmp(&b.id));

                prop_assert_eq!(cmp.compare_at(&a, &b, later), expected);
                prop_assert_eq!(cmp.less_at(&a, &b, later), expected == Ordering::Less);
                Ok(())
            },
        )
        .unwrap();
}
