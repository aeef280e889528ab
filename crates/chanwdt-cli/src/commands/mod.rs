//! Command implementations.

pub mod config;
pub mod run;

use std::path::Path;

use chanwdt_service::ServiceConfig;

use crate::error::CliError;

/// Load a configuration file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, CliError> {
    match path {
        Some(path) => Ok(ServiceConfig::from_json_file(path)?),
        None => Ok(ServiceConfig::default()),
    }
}
