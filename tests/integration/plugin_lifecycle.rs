//! Plugin lifecycle against an in-memory backend: refresh, failure containment, ordering

use crate::integration::test_utils::{test_config, FakeBackend, BANDWIDTH, LOAD, MEMORY};
use chrono::{Duration as ChronoDuration, Utc};
use contextprio::classify::ContextTier;
use contextprio::queue::PendingWorkload;
use contextprio::telemetry::MetricKind;
use contextprio::{ContextPrio, QueueSortPlugin, TelemetryError};
use std::sync::Arc;
use std::time::Duration;

fn plugin(nodes: &[&str]) -> (ContextPrio, Arc<FakeBackend>) {
    let backend = Arc::new(FakeBackend::default());
    let plugin = ContextPrio::with_backend(&test_config(nodes), backend.clone()).unwrap();
    (plugin, backend)
}

#[tokio::test]
async fn test_refresh_populates_every_metric() {
    let (plugin, backend) = plugin(&["w1", "w2"]);
    for node in ["w1", "w2"] {
        backend.set(node, BANDWIDTH, vec![20.0]);
        backend.set(node, MEMORY, vec![40.0]);
        backend.set(node, LOAD, vec![0.7]);
    }

    let report = plugin.refresh_now().await;
    assert_eq!(report.refreshed, 6);
    assert_eq!(report.failed, 0);
    assert_eq!(backend.calls(), 6);

    let snapshot = plugin.cache().snapshot();
    assert_eq!(snapshot.len(), 6);
    assert_eq!(snapshot[0].node, "w1");
    assert_eq!(snapshot[0].kind, MetricKind::Bandwidth);
    assert_eq!(plugin.node_placement_tier("w2"), Some(ContextTier::Lowest));
}

#[tokio::test]
async fn test_ambiguous_result_keeps_prior_entry() {
    let (plugin, backend) = plugin(&["w1"]);
    backend.set("w1", BANDWIDTH, vec![30.0]);
    plugin.refresh_now().await;
    assert_eq!(
        plugin.cache().get(MetricKind::Bandwidth, "w1").unwrap().value,
        30.0
    );

    backend.set("w1", BANDWIDTH, vec![70.0, 90.0]);
    let report = plugin.refresh_now().await;
    assert_eq!(report.refreshed, 0);
    assert_eq!(
        plugin.cache().get(MetricKind::Bandwidth, "w1").unwrap().value,
        30.0
    );

    let results = plugin.probe("w1", &[MetricKind::Bandwidth]).await;
    assert!(matches!(
        results[0].1,
        Err(TelemetryError::ResultCardinalityMismatch { expected: 1, got: 2, .. })
    ));
}

#[tokio::test]
async fn test_unreachable_backend_fails_open() {
    let (plugin, backend) = plugin(&["w1"]);
    for family in [BANDWIDTH, MEMORY, LOAD] {
        backend.fail(
            "w1",
            family,
            TelemetryError::BackendUnreachable("connection refused".to_string()),
        );
    }
    let report = plugin.refresh_now().await;
    assert_eq!(report.failed, 3);

    let now = Utc::now();
    let low = PendingWorkload::new("low", now)
        .with_annotation("v2x.context", "Low")
        .on_node("w1");
    let older_plain = PendingWorkload::new("plain", now - ChronoDuration::seconds(60)).on_node("w1");

    assert_eq!(plugin.effective_priority(&low).effective, ContextTier::Low);
    assert!(plugin.less(&low, &older_plain));
}

#[tokio::test]
async fn test_congestion_reorders_queue() {
    let (plugin, backend) = plugin(&["hot", "cool"]);
    backend.set("hot", MEMORY, vec![92.0]);
    backend.set("cool", MEMORY, vec![35.0]);
    plugin.refresh_now().await;

    let now = Utc::now();
    let mut queue = vec![
        PendingWorkload::new("on-hot", now)
            .with_annotation("v2x.context", "High")
            .on_node("hot"),
        PendingWorkload::new("on-cool", now + ChronoDuration::seconds(1))
            .with_annotation("v2x.context", "High")
            .on_node("cool"),
    ];
    plugin.sort_pending(&mut queue);
    assert_eq!(queue[0].id.as_str(), "on-cool");
    assert_eq!(plugin.effective_priority(&queue[1]).effective, ContextTier::Low);
}

#[tokio::test]
async fn test_background_refresh_tracks_new_nodes() {
    let (plugin, backend) = plugin(&[]);
    backend.set("late", LOAD, vec![3.0]);
    plugin.start_refresh();

    assert!(plugin.track_node("late"));
    tokio::time::timeout(Duration::from_secs(10), async {
        while plugin.cache().get(MetricKind::Load1m, "late").is_none() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("tracked node should be refreshed by the background task");

    plugin.stop_refresh().await;
    assert!(!plugin.is_refreshing());

    let calls = backend.calls();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(backend.calls(), calls);
}
