//! Scheduler port for cron-style recurring jobs
//!
//! The calendar mechanism itself is external; the core only needs to hand a
//! job body to it and later stop the returned handle before installing a
//! replacement.

use async_trait::async_trait;
use futures::future::BoxFuture;
use magpie_core::error::Result;
use std::sync::Arc;

/// A repeatable job body. Each tick gets a fresh future from the closure.
pub type JobFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Handle to a scheduled recurring job
#[async_trait]
pub trait JobHandle: Send + Sync {
    /// Stop the job.
    ///
    /// Idempotent. When this returns, no new tick will start; a tick already
    /// running is awaited by implementations that can do so.
    async fn stop(&self);
}

/// Schedules recurring jobs from cron-style specs
pub trait Scheduler: Send + Sync {
    /// Schedule `job` to run per the cron `spec`.
    ///
    /// Fails if the spec does not parse. The job runs until the returned
    /// handle is stopped or dropped by its owner.
    fn schedule(&self, spec: &str, job: JobFn) -> Result<Box<dyn JobHandle>>;
}
