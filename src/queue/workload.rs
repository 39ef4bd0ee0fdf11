//! Pending workloads as seen by the queue-sort plugin.
//!
//! The host scheduler owns these values; the plugin only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Workload identifier, used as the final ordering tie-breaker
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkloadId(String);

impl WorkloadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a workload is headed: nowhere yet, one node, or a candidate set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    #[default]
    Unassigned,
    Node(String),
    Candidates(Vec<String>),
}

impl Placement {
    pub fn nodes(&self) -> &[String] {
        match self {
            Placement::Unassigned => &[],
            Placement::Node(node) => std::slice::from_ref(node),
            Placement::Candidates(nodes) => nodes,
        }
    }
}

/// A workload waiting in the scheduling queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingWorkload {
    pub id: WorkloadId,
    /// Workload metadata; the declared context lives under one annotation key
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub placement: Placement,
    pub enqueued_at: DateTime<Utc>,
}

impl PendingWorkload {
    pub fn new(id: impl Into<String>, enqueued_at: DateTime<Utc>) -> Self {
        Self {
            id: WorkloadId::new(id),
            annotations: BTreeMap::new(),
            placement: Placement::Unassigned,
            enqueued_at,
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn on_node(mut self, node: impl Into<String>) -> Self {
        self.placement = Placement::Node(node.into());
        self
    }

    pub fn on_candidates<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.placement = Placement::Candidates(nodes.into_iter().map(Into::into).collect());
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}
