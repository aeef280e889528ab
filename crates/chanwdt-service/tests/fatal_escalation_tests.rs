//! The default missing-handler policy aborts the process.
//!
//! The abort runs in a child copy of this test binary so the harness
//! itself survives.

use chanwdt_service::prelude::*;
use std::process::Command;
use std::time::Duration;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const CHILD_ENV: &str = "CHANWDT_ABORT_CHILD";
const CHILD_TEST: &str = "unhandled_timeout_aborts_under_default_policy";

fn expire_unhandled_channel() -> TestResult {
    chanwdt_service::init_logging(0)?;
    let clock = ManualClock::new();
    let watchdog: Watchdog<(), ManualClock> =
        Watchdog::with_clock(WatchdogConfig::default(), clock.clone())?;
    watchdog.init();
    watchdog.add(Duration::from_millis(10), None, ())?;

    clock.advance(Duration::from_millis(10));
    watchdog.process();
    Err("process returned after an unhandled timeout".into())
}

#[test]
fn unhandled_timeout_aborts_under_default_policy() -> TestResult {
    if std::env::var_os(CHILD_ENV).is_some() {
        return expire_unhandled_channel();
    }

    let output = Command::new(std::env::current_exe()?)
        .args(["--exact", CHILD_TEST, "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .env_remove("RUST_LOG")
        .output()?;

    assert!(!output.status.success());
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(output.status.signal(), Some(6));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No handler for expired channel, aborting process"));
    assert!(stderr.contains("Watchdog channel timeout"));
    Ok(())
}
