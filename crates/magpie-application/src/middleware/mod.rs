//! Middleware components for the application layer
//!
//! Middleware here are decorators composed around an asynchronous action to
//! add cross-cutting admission and scheduling concerns:
//!
//! - **RateLimitLayer**: per-key sliding-window admission control
//! - **TaskQueueLayer**: per-key strict serialization of actions
//!
//! A layer never changes what the base action does or how it fails; it only
//! gates whether and when the action runs.
//!
//! # Composition
//!
//! [`Wrap`] applies layers so the FIRST `.with()` is the OUTERMOST: its
//! admission logic runs first and only forwards to the next layer if it
//! permits. The documented usage composes rate limiting outermost and
//! queuing innermost, so an over-limit call never reaches the queue at all.
//!
//! ```rust,ignore
//! let send = Wrap::new(move |group| send_report(group))
//!     .with(RateLimitLayer::new(limiter, policy))
//!     .with(TaskQueueLayer::new(queue))
//!     .build();
//!
//! send(group_id).await?;
//! ```

mod rate_limit;
mod task_queue;

pub use rate_limit::{Admission, RateLimitLayer, RateLimitPolicy, RateLimiter};
pub use task_queue::{QueueKey, TaskQueue, TaskQueueLayer};

use crate::Result;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// A type-erased asynchronous action of one argument.
///
/// The unit of composition: base handler actions and every wrapped stage
/// share this signature, so layers stack without changing the call site.
pub type Action<A> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Lift an async closure into an [`Action`].
pub fn action<A, F, Fut>(f: F) -> Action<A>
where
    A: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |arg| Box::pin(f(arg)))
}

/// A pure `Action -> Action` transformation.
///
/// Implementations must preserve the base action's success/error contract;
/// they decide only whether and when the inner action runs.
pub trait Layer<A>: Send + Sync {
    /// Wrap `next`, returning the composed action.
    fn wrap(&self, next: Action<A>) -> Action<A>;
}

/// Builder that composes an ordered list of layers around a base action.
///
/// Layers are applied so the first `.with()` is the outermost wrapper.
/// Zero layers yields behavior identical to the bare action.
pub struct Wrap<A> {
    base: Action<A>,
    layers: Vec<Box<dyn Layer<A>>>,
}

impl<A: Send + 'static> Wrap<A> {
    /// Start composing around an async closure.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::from_action(action(f))
    }

    /// Start composing around an existing [`Action`].
    pub fn from_action(base: Action<A>) -> Self {
        Self {
            base,
            layers: Vec::new(),
        }
    }

    /// Add a layer. The first layer added becomes the outermost wrapper.
    pub fn with(mut self, layer: impl Layer<A> + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Apply the layers and return the composed action.
    pub fn build(self) -> Action<A> {
        // Innermost-first application makes the first-listed layer outermost.
        let mut composed = self.base;
        for layer in self.layers.iter().rev() {
            composed = layer.wrap(composed);
        }
        composed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Layer that tags invocations so composition order is observable.
    struct TagLayer {
        tag: &'static str,
        log: Arc<std::sync::Mutex<Vec<&'static str>>>,
    }

    impl Layer<u32> for TagLayer {
        fn wrap(&self, next: Action<u32>) -> Action<u32> {
            let tag = self.tag;
            let log = Arc::clone(&self.log);
            Arc::new(move |arg| {
                log.lock().unwrap().push(tag);
                next(arg)
            })
        }
    }

    #[tokio::test]
    async fn test_zero_layers_is_transparent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let wrapped = Wrap::new(move |_: u32| {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .build();

        wrapped(7).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_layers_preserves_errors() {
        let wrapped = Wrap::new(|_: u32| async {
            Err(magpie_core::Error::Internal("boom".to_string()).into())
        })
        .build();

        let err = wrapped(7).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_first_with_is_outermost() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log_base = Arc::clone(&log);

        let wrapped = Wrap::new(move |_: u32| {
            let log = Arc::clone(&log_base);
            async move {
                log.lock().unwrap().push("base");
                Ok(())
            }
        })
        .with(TagLayer {
            tag: "outer",
            log: Arc::clone(&log),
        })
        .with(TagLayer {
            tag: "inner",
            log: Arc::clone(&log),
        })
        .build();

        wrapped(1).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["outer", "inner", "base"]);
    }
}
