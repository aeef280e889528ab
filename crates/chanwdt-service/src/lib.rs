//! # chanwdt-service
//!
//! Platform layer for the `chanwdt` software watchdog.
//!
//! The core crate owns the channel table and the timeout scan but never
//! spawns threads. This crate supplies the collaborators around it:
//!
//! - [`driver`] - Background thread that calls `Watchdog::process` on a cadence
//! - [`service`] - `init`/`cleanup` lifecycle tying a watchdog to its driver
//! - [`config`] - Service configuration, loadable from JSON
//! - [`logging`] - `tracing-subscriber` setup for binaries
//!
//! ## Example
//!
//! ```rust
//! use chanwdt_service::prelude::*;
//!
//! let config = ServiceConfig::builder()
//!     .poll_interval_ms(20)
//!     .wake_strategy(WakeStrategy::NextDeadline)
//!     .build()?;
//! let mut service: WatchdogService = WatchdogService::init(config)?;
//! assert!(service.is_running());
//! service.cleanup();
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

pub mod config;
pub mod driver;
pub mod logging;
pub mod service;

pub mod prelude;

pub use config::{DEFAULT_POLL_INTERVAL_MS, ServiceConfig, ServiceConfigBuilder, WakeStrategy};
pub use driver::{DriverCadence, PeriodicDriver};
pub use logging::init_logging;
pub use service::WatchdogService;
