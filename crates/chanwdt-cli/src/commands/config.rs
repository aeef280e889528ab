//! Configuration file commands.

use std::path::Path;

use chanwdt_service::ServiceConfig;
use tracing::info;

use crate::error::CliError;
use crate::output;

/// Validate a configuration file and print it with defaults filled in.
pub fn check(path: &Path, json: bool) -> Result<(), CliError> {
    let config = ServiceConfig::from_json_file(path)?;
    info!(path = %path.display(), "Configuration is valid");

    if json {
        output::print_json(&serde_json::json!({
            "success": true,
            "config": config,
        }))
    } else {
        println!("Configuration {} is valid", path.display());
        println!("{}", serde_json::to_string_pretty(&config)?);
        Ok(())
    }
}

/// Print the default configuration as JSON.
pub fn print_default() -> Result<(), CliError> {
    output::print_json(&ServiceConfig::default())
}
