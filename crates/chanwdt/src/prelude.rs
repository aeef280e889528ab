//! Prelude for chanwdt.
//!
//! This module re-exports the most commonly used types for convenient importing.
//!
//! # Example
//!
//! ```rust
//! use chanwdt::prelude::*;
//!
//! let watchdog: Watchdog<u32> = Watchdog::new(WatchdogConfig::default())?;
//! watchdog.init();
//! assert_eq!(watchdog.capacity(), DEFAULT_CAPACITY);
//! # Ok::<(), WatchdogError>(())
//! ```

pub use crate::channel::{ChannelId, ChannelInfo, NextTimeout, TimeoutHandler};
pub use crate::clock::{Clock, ManualClock, MonotonicClock, Tick};
pub use crate::config::{DEFAULT_CAPACITY, MissingHandlerPolicy, WatchdogConfig};
pub use crate::error::{WatchdogError, WatchdogResult};
pub use crate::stats::WatchdogStats;
pub use crate::watchdog::{ScanReport, Watchdog};
