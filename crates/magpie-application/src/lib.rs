//! Magpie application layer
//!
//! Use cases over the port traits: middleware composition (rate limiting,
//! task queuing), the heartbeat watchdog, event dispatch, the built-in
//! handlers, and the [`AppContext`] that wires them together.
//!
//! # Module Organization
//!
//! - `middleware` - Action composition: rate limit and task queue layers
//! - `services` - Watchdog, dispatcher, and the scheduled-job slot
//! - `handlers` - Built-in rank and word-cloud handlers
//! - `context` - Application assembly and lifecycle
//! - `error` - Application layer errors

pub mod context;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

pub use context::AppContext;
pub use error::{Error, Result};
pub use handlers::{RankHandler, WordCloudHandler};
pub use middleware::{
    action, Action, Admission, Layer, QueueKey, RateLimitLayer, RateLimitPolicy, RateLimiter,
    TaskQueue, TaskQueueLayer, Wrap,
};
pub use services::{Dispatcher, GroupHandler, HeartbeatWatchdog, JobSlot, WatchdogState};
