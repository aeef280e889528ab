//! Concurrency tests for the watchdog.

use chanwdt::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn shared_watchdog(clock: &ManualClock) -> WatchdogResult<Arc<Watchdog<usize, ManualClock>>> {
    let config = WatchdogConfig::builder()
        .missing_handler_policy(MissingHandlerPolicy::Report)
        .build()?;
    let watchdog = Watchdog::with_clock(config, clock.clone())?;
    watchdog.init();
    Ok(Arc::new(watchdog))
}

#[test]
fn test_concurrent_add_never_exceeds_capacity() -> TestResult {
    let clock = ManualClock::new();
    let watchdog = shared_watchdog(&clock)?;
    let accepted = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    for i in 0..32 {
        let watchdog = Arc::clone(&watchdog);
        let accepted = Arc::clone(&accepted);
        handles.push(thread::spawn(move || {
            match watchdog.add(Duration::from_secs(60), None, i) {
                Ok(_) => {
                    accepted.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                Err(WatchdogError::CapacityExceeded { capacity })
                    if capacity == DEFAULT_CAPACITY =>
                {
                    Ok(())
                }
                Err(other) => Err(other),
            }
        }));
    }

    for handle in handles {
        let joined = handle.join().map_err(|_| "Thread should not panic")?;
        joined?;
    }

    assert_eq!(accepted.load(Ordering::SeqCst), DEFAULT_CAPACITY);
    assert_eq!(watchdog.active_count(), DEFAULT_CAPACITY);

    let indices: Vec<usize> = watchdog.channels().iter().map(|c| c.id.index()).collect();
    assert_eq!(indices, (0..DEFAULT_CAPACITY).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn test_concurrent_feeders_keep_channels_alive() -> TestResult {
    let clock = ManualClock::new();
    let watchdog = shared_watchdog(&clock)?;
    let fired = Arc::new(AtomicUsize::new(0));

    let mut ids = Vec::new();
    for i in 0..4 {
        let fired = Arc::clone(&fired);
        ids.push(watchdog.add_with_handler(
            Duration::from_millis(100),
            move |_, _| {
                fired.fetch_add(1, Ordering::SeqCst);
            },
            i,
        )?);
    }

    for _ in 0..50 {
        clock.advance(Duration::from_millis(50));
        let mut handles = vec![];
        for &id in &ids {
            let watchdog = Arc::clone(&watchdog);
            handles.push(thread::spawn(move || watchdog.feed(id)));
        }
        for handle in handles {
            let joined = handle.join();
            assert!(matches!(joined, Ok(Ok(()))), "feed should succeed");
        }
        assert!(watchdog.process().is_empty());
    }

    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(watchdog.stats().feeds, 200);
    Ok(())
}

#[test]
fn test_scan_racing_with_feeds_fires_at_most_once() -> TestResult {
    let clock = ManualClock::new();
    let watchdog = shared_watchdog(&clock)?;
    let fired = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&fired);
    let id = watchdog.add_with_handler(
        Duration::from_millis(10),
        move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
        0,
    )?;
    clock.advance(Duration::from_millis(10));

    let scanner = {
        let watchdog = Arc::clone(&watchdog);
        thread::spawn(move || {
            let mut total = 0;
            for _ in 0..100 {
                total += watchdog.process().fired.len();
            }
            total
        })
    };
    let feeder = {
        let watchdog = Arc::clone(&watchdog);
        thread::spawn(move || {
            for _ in 0..100 {
                // Either fed before the scan or rejected after it fired.
                let result = watchdog.feed(id);
                assert!(matches!(result, Ok(()) | Err(WatchdogError::InvalidHandle(_))));
            }
        })
    };

    assert!(feeder.join().is_ok(), "Feeder should not panic");
    let total = scanner.join().map_err(|_| "Scanner panicked")?;
    assert!(total <= 1);
    assert_eq!(fired.load(Ordering::SeqCst), total);
    Ok(())
}

#[test]
fn test_suspend_from_other_thread() -> TestResult {
    let clock = ManualClock::new();
    let watchdog = shared_watchdog(&clock)?;
    watchdog.add(Duration::from_millis(10), None, 0)?;

    let suspender = {
        let watchdog = Arc::clone(&watchdog);
        thread::spawn(move || watchdog.suspend())
    };
    assert!(suspender.join().is_ok(), "Thread should not panic");

    clock.advance(Duration::from_secs(1));
    assert!(watchdog.process().is_empty());
    assert_eq!(watchdog.active_count(), 1);
    Ok(())
}
