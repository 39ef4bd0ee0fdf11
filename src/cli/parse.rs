//! CLI parse: clap types for contextprio. No behavior; definitions only.

use crate::telemetry::MetricKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// contextprio - telemetry-aware dispatch ordering for pending workloads
#[derive(Parser)]
#[command(name = "contextprio")]
#[command(about = "Probe node telemetry and dry-run the ContextPrio dispatch order")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (holds config/config.toml)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch live telemetry for a node once and classify it
    Probe {
        /// Node identifier
        node: String,
        /// Only fetch this metric (bandwidth, memory_utilization, load1m)
        #[arg(long)]
        metric: Option<MetricKind>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Sort pending workloads from a JSON file into dispatch order
    Order {
        /// JSON array of pending workloads
        workloads: PathBuf,
        /// Skip the telemetry refresh; everything is treated as uncongested
        #[arg(long)]
        offline: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Validate the effective configuration and print it as TOML
    Config,
}
