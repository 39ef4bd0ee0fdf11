//! Merge rules: defaults, override order, conflict handling.

use crate::queue::DEFAULT_CONTEXT_ANNOTATION;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// `backend.address`, `backend.network_interface`, `backend.time_range_minutes`
/// and the budgets have no defaults; a deployment must set them.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("context_annotation", DEFAULT_CONTEXT_ANNOTATION)?
        .set_default("backend.connect_timeout_secs", 5)?
        .set_default("backend.request_timeout_secs", 10)?
        .set_default("refresh.interval_secs", 30)
}
