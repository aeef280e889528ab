//! Prelude for chanwdt-service.
//!
//! Re-exports the service types together with the core watchdog prelude.

pub use crate::config::{ServiceConfig, WakeStrategy};
pub use crate::driver::{DriverCadence, PeriodicDriver};
pub use crate::service::WatchdogService;
pub use chanwdt::prelude::*;
