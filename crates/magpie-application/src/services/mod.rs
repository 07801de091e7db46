//! Long-running application services
//!
//! - **HeartbeatWatchdog**: stall detection and session recovery
//! - **Dispatcher**: the event loop feeding watchdog and handlers
//! - **JobSlot**: stop-then-replace ownership of a scheduled job

mod dispatcher;
mod job_slot;
mod watchdog;

pub use dispatcher::{Dispatcher, GroupHandler};
pub use job_slot::JobSlot;
pub use watchdog::{HeartbeatWatchdog, WatchdogState};
