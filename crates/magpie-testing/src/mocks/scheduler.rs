//! Mock scheduler with manually triggered ticks
//!
//! The mock never runs a calendar. Scheduled jobs are held in registration
//! order; the test fires them with [`MockScheduler::run_all`], which skips
//! jobs whose handle has been stopped.

use async_trait::async_trait;
use magpie_core::error::{Error, Result};
use magpie_ports::{JobFn, JobHandle, Scheduler};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

struct ScheduledJob {
    spec: String,
    job: JobFn,
    stopped: Arc<AtomicBool>,
}

/// Handle whose stop flag the scheduler consults before each manual tick
pub struct MockJobHandle {
    stopped: Arc<AtomicBool>,
}

impl MockJobHandle {
    /// Returns true once stopped
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobHandle for MockJobHandle {
    async fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// A scheduler the test ticks by hand
#[derive(Default)]
pub struct MockScheduler {
    jobs: RwLock<Vec<ScheduledJob>>,
    fail_schedule: AtomicBool,
}

impl MockScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent schedule calls fail (or succeed again)
    pub fn set_fail_schedule(&self, fail: bool) {
        self.fail_schedule.store(fail, Ordering::SeqCst);
    }

    /// Run every job that has not been stopped, in registration order.
    pub async fn run_all(&self) {
        let live: Vec<JobFn> = self
            .jobs
            .read()
            .unwrap()
            .iter()
            .filter(|scheduled| !scheduled.stopped.load(Ordering::SeqCst))
            .map(|scheduled| Arc::clone(&scheduled.job))
            .collect();
        for job in live {
            job().await;
        }
    }

    /// Number of jobs ever scheduled
    pub fn scheduled_count(&self) -> usize {
        self.jobs.read().unwrap().len()
    }

    /// Number of jobs whose handle is still live
    pub fn active_count(&self) -> usize {
        self.jobs
            .read()
            .unwrap()
            .iter()
            .filter(|scheduled| !scheduled.stopped.load(Ordering::SeqCst))
            .count()
    }

    /// Cron specs in registration order
    pub fn specs(&self) -> Vec<String> {
        self.jobs
            .read()
            .unwrap()
            .iter()
            .map(|scheduled| scheduled.spec.clone())
            .collect()
    }
}

impl Scheduler for MockScheduler {
    fn schedule(&self, spec: &str, job: JobFn) -> Result<Box<dyn JobHandle>> {
        if self.fail_schedule.load(Ordering::SeqCst) {
            return Err(Error::schedule(spec, "mock schedule failure"));
        }
        let stopped = Arc::new(AtomicBool::new(false));
        self.jobs.write().unwrap().push(ScheduledJob {
            spec: spec.to_string(),
            job,
            stopped: Arc::clone(&stopped),
        });
        Ok(Box::new(MockJobHandle { stopped }))
    }
}
