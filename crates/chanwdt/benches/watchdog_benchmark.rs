//! Performance benchmarks for the watchdog hot paths.

use chanwdt::prelude::*;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;

fn filled_watchdog(channels: usize) -> WatchdogResult<(Watchdog<(), ManualClock>, Vec<ChannelId>)> {
    let config = WatchdogConfig::builder()
        .capacity(channels.max(1))
        .missing_handler_policy(MissingHandlerPolicy::Report)
        .build()?;
    let watchdog = Watchdog::with_clock(config, ManualClock::new())?;
    watchdog.init();
    let mut ids = Vec::with_capacity(channels);
    for _ in 0..channels {
        ids.push(watchdog.add(Duration::from_secs(3600), None, ())?);
    }
    Ok((watchdog, ids))
}

fn bench_feed(c: &mut Criterion) {
    let Ok((watchdog, ids)) = filled_watchdog(16) else {
        return;
    };
    let Some(&id) = ids.last() else {
        return;
    };

    c.bench_function("feed_last_of_16", |b| {
        b.iter(|| watchdog.feed(black_box(id)));
    });
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_no_expiry");
    for channels in [1usize, 16, 64, 256] {
        let Ok((watchdog, _)) = filled_watchdog(channels) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(channels), &channels, |b, _| {
            b.iter(|| black_box(watchdog.process()));
        });
    }
    group.finish();
}

fn bench_add_delete(c: &mut Criterion) {
    let Ok((watchdog, _)) = filled_watchdog(15) else {
        return;
    };

    c.bench_function("add_delete_last_free_slot", |b| {
        b.iter(|| {
            watchdog
                .add(black_box(Duration::from_millis(100)), None, ())
                .and_then(|id| watchdog.delete(id))
        });
    });
}

fn bench_next_timeout(c: &mut Criterion) {
    let Ok((watchdog, _)) = filled_watchdog(16) else {
        return;
    };

    c.bench_function("time_until_next_timeout", |b| {
        b.iter(|| black_box(watchdog.time_until_next_timeout()));
    });
}

criterion_group!(
    benches,
    bench_feed,
    bench_process,
    bench_add_delete,
    bench_next_timeout
);
criterion_main!(benches);
