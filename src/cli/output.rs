//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::PrioError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &PrioError) -> String {
    match e {
        PrioError::ConfigInvalid(msg) => format!("configuration error: {}", msg),
        PrioError::Telemetry(err) => format!("telemetry error: {}", err),
        other => other.to_string(),
    }
}
