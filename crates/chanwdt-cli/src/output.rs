//! Human and JSON rendering of command results.

use serde::Serialize;

use crate::commands::run::SessionReport;
use crate::error::CliError;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_session_human(report: &SessionReport) {
    println!(
        "Session: {} task(s) for {}ms, {} scan(s)",
        report.tasks.len(),
        report.duration_ms,
        report.scans
    );
    for task in &report.tasks {
        let state = match (task.fired, task.stalled) {
            (true, _) => "TIMED OUT",
            (false, true) => "stalled (not yet expired)",
            (false, false) => "ok",
        };
        println!("  {:<12} {:>4}  {state}", task.name, task.channel.to_string());
    }
    println!(
        "Stats: added={} deleted={} feeds={} timeouts={} unhandled={}",
        report.stats.channels_added,
        report.stats.channels_deleted,
        report.stats.feeds,
        report.stats.timeouts,
        report.stats.unhandled_timeouts
    );
}

pub fn print_error_human(error: &anyhow::Error) {
    eprintln!("Error: {error}");
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

pub fn print_error_json(error: &anyhow::Error) {
    let code = error.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
    let body = serde_json::json!({
        "success": false,
        "error": error.to_string(),
        "code": code,
    });
    eprintln!("{body}");
}
