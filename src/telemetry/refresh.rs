//! Periodic background refresh of the telemetry cache.

use crate::telemetry::{TelemetryCache, TelemetryClient};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Node set the refresh task samples on each round. Shared with the host so
/// nodes can be tracked and untracked at runtime.
pub type TrackedNodes = Arc<RwLock<BTreeSet<String>>>;

/// Spawns the refresh loop
pub struct RefreshTask;

impl RefreshTask {
    /// Start refreshing `nodes` into `cache` every `interval`.
    ///
    /// The first round runs immediately. Must be called within a tokio runtime.
    pub fn spawn(
        cache: Arc<TelemetryCache>,
        client: Arc<TelemetryClient>,
        nodes: TrackedNodes,
        interval: Duration,
    ) -> RefreshHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                interval_secs = interval.as_secs(),
                backend = %client.backend_address(),
                "Telemetry refresh task started"
            );

            loop {
                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        // Sender dropped or shutdown requested
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let targets: Vec<String> = nodes.read().iter().cloned().collect();
                        if targets.is_empty() {
                            debug!("No tracked nodes, skipping refresh round");
                            continue;
                        }
                        // A round in progress always runs to completion; shutdown
                        // is only observed between rounds.
                        let report = cache.refresh(&client, &targets).await;
                        let pruned = cache.prune();
                        debug!(
                            refreshed = report.refreshed,
                            failed = report.failed,
                            coalesced = report.coalesced,
                            pruned,
                            "Refresh round complete"
                        );
                    }
                }
            }

            info!("Telemetry refresh task stopped");
        });

        RefreshHandle { shutdown_tx, join }
    }
}

/// Handle to a running refresh task. Dropping it also stops the task after
/// the current round.
pub struct RefreshHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stop scheduling new rounds and wait for the task to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.join.await;
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
