//! CLI route: single route table and run context. Dispatches to the plugin and presentation.

use crate::cli::command_name;
use crate::cli::parse::Commands;
use crate::cli::presentation::{format_dispatch_order, format_probe_result, DispatchRow, ProbeRow};
use crate::config::{ConfigLoader, ContextPrioConfig};
use crate::error::PrioError;
use crate::plugin::ContextPrio;
use crate::queue::PendingWorkload;
use crate::telemetry::MetricKind;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{info, warn};

/// Runtime context for CLI execution: loaded configuration and workspace paths.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    config: ContextPrioConfig,
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, PrioError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };

        Ok(Self {
            config,
            workspace_root,
            config_path,
        })
    }

    pub fn config(&self) -> &ContextPrioConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, PrioError> {
        let started = Instant::now();
        let name = command_name(command);
        info!(
            command = name,
            workspace = %self.workspace_root.display(),
            config_path = ?self.config_path,
            "Executing command"
        );

        let result = match command {
            Commands::Probe {
                node,
                metric,
                format,
            } => self.handle_probe(node, *metric, format),
            Commands::Order {
                workloads,
                offline,
                format,
            } => self.handle_order(workloads, *offline, format),
            Commands::Config => self.handle_config(),
        };

        info!(
            command = name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn runtime() -> Result<Runtime, PrioError> {
        Ok(tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?)
    }

    fn handle_probe(
        &self,
        node: &str,
        metric: Option<MetricKind>,
        format: &str,
    ) -> Result<String, PrioError> {
        let plugin = ContextPrio::new(&self.config)?;
        let kinds: Vec<MetricKind> = match metric {
            Some(kind) => vec![kind],
            None => MetricKind::ALL.to_vec(),
        };

        let results = Self::runtime()?.block_on(plugin.probe(node, &kinds));
        if results.iter().all(|(_, r)| r.is_err()) {
            if let Some((_, Err(err))) = results.first() {
                return Err(PrioError::Telemetry(err.clone()));
            }
        }

        let rows: Vec<ProbeRow> = results
            .iter()
            .map(|(kind, result)| ProbeRow::from_result(*kind, result, plugin.thresholds()))
            .collect();
        format_probe_result(node, &rows, format)
    }

    fn handle_order(&self, path: &Path, offline: bool, format: &str) -> Result<String, PrioError> {
        let raw = std::fs::read_to_string(path)?;
        let mut workloads: Vec<PendingWorkload> = serde_json::from_str(&raw)?;
        let plugin = ContextPrio::new(&self.config)?;

        if !offline {
            let nodes: Vec<String> = workloads
                .iter()
                .flat_map(|w| w.placement.nodes().iter().cloned())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            let report = Self::runtime()?.block_on(plugin.refresh_nodes(&nodes));
            if report.failed > 0 {
                warn!(
                    failed = report.failed,
                    refreshed = report.refreshed,
                    "Some telemetry could not be fetched; affected nodes are treated as uncongested"
                );
            }
        }

        // Rows report the tiers the sort saw, even if an entry expires meanwhile
        let now = Instant::now();
        plugin.sort_pending_at(&mut workloads, now);
        let rows: Vec<DispatchRow> = workloads
            .iter()
            .enumerate()
            .map(|(i, w)| DispatchRow::new(i + 1, w, plugin.effective_priority_at(w, now)))
            .collect();
        format_dispatch_order(&rows, format)
    }

    fn handle_config(&self) -> Result<String, PrioError> {
        self.config.ensure_valid()?;
        self.config.to_toml()
    }
}
