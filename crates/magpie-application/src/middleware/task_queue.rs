//! Per-key strict serialization of asynchronous actions
//!
//! [`TaskQueue`] guarantees at most one in-flight action per key, executed
//! in arrival order. Actions under distinct keys run independently and may
//! overlap. Each key's state is a pending FIFO plus a busy flag behind the
//! DashMap entry lock; a drain task per key pops and runs jobs until the
//! queue is empty, then removes the entry.
//!
//! A failing or panicking job delivers its failure to the caller that
//! enqueued it and nothing else; the drain task moves on to the next job.
//! Panic isolation comes from running each job in its own spawned task and
//! surfacing the join error to the enqueuing caller.

use super::{Action, Layer};
use crate::{Error, Result};
use dashmap::DashMap;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

/// Identifies a serialization queue.
///
/// The process-wide queue is the degenerate case of a single implicit key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum QueueKey {
    /// The process-wide queue
    #[default]
    Default,
    /// A named per-subject queue
    Named(String),
}

impl QueueKey {
    /// Create a named queue key
    pub fn named(name: impl Into<String>) -> Self {
        QueueKey::Named(name.into())
    }
}

impl std::fmt::Display for QueueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueKey::Default => write!(f, "<default>"),
            QueueKey::Named(name) => write!(f, "{}", name),
        }
    }
}

// The Mutex is never contended: it exists so the stored future (which is
// only `Send`) does not make the map's value type `!Sync`.
type Job = (
    std::sync::Mutex<BoxFuture<'static, Result<()>>>,
    oneshot::Sender<Result<()>>,
);

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Job>,
    busy: bool,
}

/// Per-key FIFO executor for asynchronous actions
#[derive(Default)]
pub struct TaskQueue {
    queues: Arc<DashMap<QueueKey, QueueState>>,
}

impl TaskQueue {
    /// Create an empty task queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `job` under `key` and await its completion.
    ///
    /// The returned future resolves once the job has run, after all
    /// earlier-enqueued jobs for the same key have completed. The job's own
    /// error (or a `TaskAborted` if it panicked) is delivered to this caller
    /// only.
    pub fn run<F>(&self, key: QueueKey, job: F) -> impl Future<Output = Result<()>>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();

        let start_drain = {
            let mut state = self.queues.entry(key.clone()).or_default();
            state
                .pending
                .push_back((std::sync::Mutex::new(Box::pin(job)), done_tx));
            if state.busy {
                false
            } else {
                state.busy = true;
                true
            }
        };

        if start_drain {
            let queues = Arc::clone(&self.queues);
            tokio::spawn(Self::drain(queues, key));
        }

        async move {
            match done_rx.await {
                Ok(result) => result,
                Err(_) => Err(magpie_core::Error::QueueClosed.into()),
            }
        }
    }

    /// Enqueue under the process-wide default key.
    pub fn run_default<F>(&self, job: F) -> impl Future<Output = Result<()>>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.run(QueueKey::Default, job)
    }

    /// Number of keys with live queue state (for observability and tests)
    pub fn active_keys(&self) -> usize {
        self.queues.len()
    }

    /// Runs jobs for one key in FIFO order until the queue drains.
    ///
    /// The entry lock is never held across an await: each iteration pops
    /// under the lock, releases it, then runs the job.
    async fn drain(queues: Arc<DashMap<QueueKey, QueueState>>, key: QueueKey) {
        loop {
            let job = {
                let mut state = match queues.get_mut(&key) {
                    Some(state) => state,
                    None => return,
                };
                match state.pending.pop_front() {
                    Some(job) => job,
                    None => {
                        state.busy = false;
                        drop(state);
                        // Drop the entry if nothing raced in behind us.
                        queues
                            .remove_if(&key, |_, state| !state.busy && state.pending.is_empty());
                        debug!(key = %key, "Task queue drained");
                        return;
                    }
                }
            };

            let (fut, done_tx) = job;
            let fut = fut.into_inner().expect("job mutex is never contended");
            // Own task per job: a panic aborts the job, not the queue.
            let result = match tokio::spawn(fut).await {
                Ok(result) => result,
                Err(join_err) => {
                    Err(magpie_core::Error::TaskAborted(join_err.to_string()).into())
                }
            };
            // The caller may have dropped its completion future; that is
            // its choice, not a queue failure.
            let _ = done_tx.send(result);
        }
    }
}

/// Middleware layer serializing calls through a shared [`TaskQueue`].
///
/// Every call is enqueued under the layer's configured key; the caller's
/// future resolves with the action's own result once its turn completes.
pub struct TaskQueueLayer {
    queue: Arc<TaskQueue>,
    key: QueueKey,
}

impl TaskQueueLayer {
    /// Create a layer enqueuing under the process-wide default key
    pub fn new(queue: Arc<TaskQueue>) -> Self {
        Self {
            queue,
            key: QueueKey::Default,
        }
    }

    /// Enqueue under a specific key instead of the default
    pub fn with_key(mut self, key: QueueKey) -> Self {
        self.key = key;
        self
    }
}

impl<A: Send + 'static> Layer<A> for TaskQueueLayer {
    fn wrap(&self, next: Action<A>) -> Action<A> {
        let queue = Arc::clone(&self.queue);
        let key = self.key.clone();

        Arc::new(move |arg: A| {
            let completion = queue.run(key.clone(), next(arg));
            Box::pin(completion)
        })
    }
}
