//! CLI command-name contract for logging.

use crate::cli::parse::Commands;

/// Command name string used in lifecycle log events (e.g. "probe", "order").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Probe { .. } => "probe",
        Commands::Order { .. } => "order",
        Commands::Config => "config",
    }
}
