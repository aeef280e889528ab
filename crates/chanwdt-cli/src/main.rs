//! chanwdt - software watchdog command-line tool
//!
//! Runs simulated monitoring sessions against the channel watchdog and
//! validates service configuration files.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::run::RunArgs;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "chanwdt")]
#[command(about = "Multi-channel software watchdog")]
#[command(version)]
#[command(long_about = "
chanwdt drives the channel watchdog from the command line. `run` registers a
set of simulated tasks, feeds the healthy ones and reports which channels
expired. `check-config` validates a JSON service configuration.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated monitoring session
    Run(RunArgs),

    /// Validate a service configuration file
    CheckConfig {
        /// Path to the JSON configuration
        path: PathBuf,
    },

    /// Print the default service configuration
    DefaultConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = chanwdt_service::init_logging(cli.verbose) {
        eprintln!("Warning: {e}");
    }

    match execute_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run(args) => commands::run::execute(args, cli.json)?,
        Commands::CheckConfig { path } => commands::config::check(path, cli.json)?,
        Commands::DefaultConfig => commands::config::print_default()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_run_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["chanwdt", "run"])?;
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        let Commands::Run(args) = cli.command else {
            return Err("expected run command".into());
        };
        assert_eq!(args.tasks, 4);
        assert_eq!(args.period_ms, 200);
        assert_eq!(args.feed_ms, 50);
        assert!(args.stall.is_empty());
        assert!(args.config.is_none());
        Ok(())
    }

    #[test]
    fn parse_run_with_repeated_stall() -> TestResult {
        let cli = Cli::try_parse_from([
            "chanwdt", "-vv", "--json", "run", "--tasks", "3", "--stall", "0", "--stall", "2",
            "--fail-on-timeout",
        ])?;
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            return Err("expected run command".into());
        };
        assert_eq!(args.stall, vec![0, 2]);
        assert!(args.fail_on_timeout);
        Ok(())
    }

    #[test]
    fn parse_check_config_requires_path() {
        assert!(Cli::try_parse_from(["chanwdt", "check-config"]).is_err());
    }

    #[test]
    fn parse_default_config() -> TestResult {
        let cli = Cli::try_parse_from(["chanwdt", "default-config"])?;
        assert!(matches!(cli.command, Commands::DefaultConfig));
        Ok(())
    }
}
