//! Simulated monitoring session.
//!
//! Registers one channel per simulated task, feeds the healthy ones from
//! their own threads and lets the stalled ones expire.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use chanwdt::{ChannelId, Watchdog, WatchdogStats};
use chanwdt_service::{ServiceConfig, WatchdogService};
use clap::Args;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::CliError;
use crate::output;

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Service configuration file (JSON); defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of simulated tasks
    #[arg(long, default_value_t = 4)]
    pub tasks: usize,

    /// Reload period of every task channel (milliseconds)
    #[arg(long, default_value_t = 200)]
    pub period_ms: u64,

    /// Interval at which healthy tasks feed their channel (milliseconds)
    #[arg(long, default_value_t = 50)]
    pub feed_ms: u64,

    /// Index of a task that never feeds (repeatable)
    #[arg(long)]
    pub stall: Vec<usize>,

    /// Length of the session (milliseconds)
    #[arg(long, default_value_t = 1000)]
    pub duration_ms: u64,

    /// Exit with a failure status if any channel timed out
    #[arg(long)]
    pub fail_on_timeout: bool,
}

impl RunArgs {
    fn validate(&self) -> Result<(), CliError> {
        if self.tasks == 0 {
            return Err(CliError::InvalidArgument("--tasks must be at least 1".into()));
        }
        if self.period_ms == 0 || self.feed_ms == 0 {
            return Err(CliError::InvalidArgument(
                "--period-ms and --feed-ms must be greater than 0".into(),
            ));
        }
        if let Some(index) = self.stall.iter().find(|&&index| index >= self.tasks) {
            return Err(CliError::InvalidArgument(format!(
                "--stall {index} is out of range for {} task(s)",
                self.tasks
            )));
        }
        if self.feed_ms >= self.period_ms {
            warn!(
                feed_ms = self.feed_ms,
                period_ms = self.period_ms,
                "Feed interval is not shorter than the period; healthy tasks may time out"
            );
        }
        Ok(())
    }
}

/// Outcome of one simulated task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub name: String,
    pub channel: ChannelId,
    pub stalled: bool,
    pub fired: bool,
}

/// Result of a whole session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub duration_ms: u64,
    pub scans: u64,
    pub tasks: Vec<TaskOutcome>,
    pub stats: WatchdogStats,
}

impl SessionReport {
    pub fn timed_out(&self) -> usize {
        self.tasks.iter().filter(|task| task.fired).count()
    }
}

pub fn execute(args: &RunArgs, json: bool) -> Result<(), CliError> {
    args.validate()?;
    let config = super::load_config(args.config.as_deref())?;
    let report = run_session(args, config)?;

    if json {
        output::print_json(&report)?;
    } else {
        output::print_session_human(&report);
    }

    let timed_out = report.timed_out();
    if args.fail_on_timeout && timed_out > 0 {
        return Err(CliError::TimeoutsDetected(timed_out));
    }
    Ok(())
}

pub fn run_session(args: &RunArgs, config: ServiceConfig) -> Result<SessionReport, CliError> {
    let mut service: WatchdogService<String> = WatchdogService::init(config)?;
    let watchdog = Arc::clone(service.watchdog());
    let fired: Arc<Mutex<Vec<ChannelId>>> = Arc::default();
    let period = Duration::from_millis(args.period_ms);

    let mut tasks = Vec::with_capacity(args.tasks);
    for index in 0..args.tasks {
        let name = format!("task-{index}");
        let sink = Arc::clone(&fired);
        let id = watchdog.add_with_handler(
            period,
            move |id, name: String| {
                warn!(channel = %id, task = %name, "Task missed its deadline");
                sink.lock().push(id);
            },
            name.clone(),
        )?;
        tasks.push((name, id, args.stall.contains(&index)));
    }
    info!(tasks = tasks.len(), period_ms = args.period_ms, "Session started");

    let stop = Arc::new(AtomicBool::new(false));
    let feed_interval = Duration::from_millis(args.feed_ms);
    let feeders: Vec<_> = tasks
        .iter()
        .filter(|(_, _, stalled)| !stalled)
        .map(|&(_, id, _)| {
            let watchdog = Arc::clone(&watchdog);
            let stop = Arc::clone(&stop);
            thread::spawn(move || feed_loop(&watchdog, id, feed_interval, &stop))
        })
        .collect();

    thread::sleep(Duration::from_millis(args.duration_ms));
    stop.store(true, Ordering::Relaxed);
    for feeder in feeders {
        if feeder.join().is_err() {
            warn!("Feeder thread panicked");
        }
    }

    let scans = service.scan_count();
    let stats = watchdog.stats();
    service.cleanup();

    let fired = fired.lock();
    let tasks = tasks
        .into_iter()
        .map(|(name, channel, stalled)| TaskOutcome {
            fired: fired.contains(&channel),
            name,
            channel,
            stalled,
        })
        .collect();

    Ok(SessionReport {
        duration_ms: args.duration_ms,
        scans,
        tasks,
        stats,
    })
}

fn feed_loop(watchdog: &Watchdog<String>, id: ChannelId, interval: Duration, stop: &AtomicBool) {
    while !stop.load(Ordering::Relaxed) {
        if let Err(err) = watchdog.feed(id) {
            warn!(channel = %id, error = %err, "Feeding stopped");
            return;
        }
        thread::sleep(interval);
    }
}
