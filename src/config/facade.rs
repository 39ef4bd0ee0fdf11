//! Configuration loading facade.

use super::merge::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::ContextPrioConfig;
use crate::error::PrioError;
use config::{Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable prefix; `CONTEXTPRIO__BACKEND__ADDRESS` sets `backend.address`.
const ENV_PREFIX: &str = "CONTEXTPRIO";

/// Loads [`ContextPrioConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for `workspace_root`, later layers winning:
    /// merge-policy defaults, the global file, `config/config.toml`,
    /// `config/{CONTEXTPRIO_ENV}.toml`, then `CONTEXTPRIO__*` variables.
    pub fn load(workspace_root: &Path) -> Result<ContextPrioConfig, PrioError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let config = builder.add_source(environment()).build()?;

        debug!(workspace = %workspace_root.display(), "Loaded layered configuration");
        Ok(config.try_deserialize()?)
    }

    /// Load configuration from one explicit file over the defaults.
    pub fn load_from_file(path: &Path) -> Result<ContextPrioConfig, PrioError> {
        if !path.exists() {
            return Err(PrioError::ConfigInvalid(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let config = builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?;

        debug!(config_path = %path.display(), "Loaded configuration file");
        Ok(config.try_deserialize()?)
    }

    /// Location of the per-user configuration file, if one can be determined.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("refresh.nodes")
}
