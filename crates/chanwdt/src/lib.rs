//! # chanwdt
//!
//! Multi-channel software watchdog for detecting stalled periodic tasks.
//!
//! Each monitored task registers a liveness channel with a reload period and
//! proves it is alive by feeding the channel at least once per period. A
//! periodic driver calls [`Watchdog::process`]; any channel whose deadline
//! has passed is fired exactly once and deactivated.
//!
//! ## Architecture
//!
//! - [`watchdog`] - The `Watchdog` instance: lifecycle, mutation API, timeout scan
//! - [`channel`] - Channel handles, handler type and read-only snapshots
//! - [`clock`] - Millisecond `Tick`s and the monotonic `Clock` time source
//! - [`config`] - Instance configuration and the missing-handler policy
//! - [`stats`] - Activity counters
//! - [`error`] - Watchdog-specific error types
//!
//! The periodic driver thread and the `init`/`cleanup` service lifecycle live
//! in the `chanwdt-service` crate.
//!
//! ## Concurrency
//!
//! - One `parking_lot::Mutex` guards the channel table; every operation takes it
//! - `feed()` performs no allocation and holds the lock for O(1) work
//! - `add()`, `process()` and `resume()` hold the lock for O(N) work
//! - Handlers run after `process()` releases the lock, in channel index order
//!
//! ## Example
//!
//! ```rust
//! use chanwdt::prelude::*;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let config = WatchdogConfig::builder()
//!     .missing_handler_policy(MissingHandlerPolicy::Report)
//!     .build()?;
//! let watchdog: Watchdog<(), ManualClock> = Watchdog::with_clock(config, clock.clone())?;
//! watchdog.init();
//!
//! let id = watchdog.add(Duration::from_millis(1000), None, ())?;
//! clock.advance(Duration::from_millis(1000));
//!
//! let report = watchdog.process();
//! assert_eq!(report.unhandled, vec![id]);
//! assert_eq!(watchdog.feed(id), Err(WatchdogError::InvalidHandle(id)));
//! # Ok::<(), WatchdogError>(())
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod channel;
pub mod clock;
pub mod config;
pub mod error;
pub mod stats;
mod table;
pub mod watchdog;

pub mod prelude;

pub use channel::{ChannelId, ChannelInfo, NextTimeout, TimeoutHandler};
pub use clock::{Clock, ManualClock, MonotonicClock, Tick};
pub use config::{
    DEFAULT_CAPACITY, MAX_CAPACITY, MissingHandlerPolicy, WatchdogConfig, WatchdogConfigBuilder,
};
pub use error::{WatchdogError, WatchdogResult};
pub use stats::WatchdogStats;
pub use watchdog::{ScanReport, Watchdog};
