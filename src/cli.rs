//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to the plugin.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{format_dispatch_order, format_probe_result, DispatchRow, ProbeRow};
pub use route::RunContext;
