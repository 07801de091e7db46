//! End-to-end tests for the composed middleware stack
//!
//! Exercises rate limiting and task queuing the way the handlers compose
//! them: rate limit outermost, queue innermost, around a counting base
//! action.

use magpie_application::middleware::{
    Action, QueueKey, RateLimitLayer, RateLimitPolicy, RateLimiter, TaskQueue, TaskQueueLayer,
    Wrap,
};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

struct Probe {
    base_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    exceeded: AtomicUsize,
    last_wait_secs: AtomicU64,
}

impl Probe {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            base_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            exceeded: AtomicUsize::new(0),
            last_wait_secs: AtomicU64::new(0),
        })
    }
}

fn policy(probe: &Arc<Probe>, limit: u32, period: Duration) -> RateLimitPolicy<u32> {
    let exceed_probe = Arc::clone(probe);
    RateLimitPolicy {
        key: Arc::new(|arg: &u32| format!("group:{}", arg)),
        limit: Arc::new(move |_| limit),
        period: Arc::new(move |_| period),
        exceed_action: Arc::new(move |_, wait_secs| {
            let probe = Arc::clone(&exceed_probe);
            Box::pin(async move {
                probe.exceeded.fetch_add(1, Ordering::SeqCst);
                probe.last_wait_secs.store(wait_secs, Ordering::SeqCst);
            })
        }),
    }
}

/// Rate limit outermost, queue innermost, base action of `work` duration.
fn composed(probe: &Arc<Probe>, limit: u32, period: Duration, work: Duration) -> Action<u32> {
    let base_probe = Arc::clone(probe);
    Wrap::new(move |_: u32| {
        let probe = Arc::clone(&base_probe);
        async move {
            let current = probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            probe.max_in_flight.fetch_max(current, Ordering::SeqCst);
            sleep(work).await;
            probe.in_flight.fetch_sub(1, Ordering::SeqCst);
            probe.base_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .with(RateLimitLayer::new(
        Arc::new(RateLimiter::new()),
        policy(probe, limit, period),
    ))
    .with(TaskQueueLayer::new(Arc::new(TaskQueue::new())))
    .build()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_over_limit_call_never_reaches_the_queue() {
    let probe = Probe::new();
    let action = composed(&probe, 1, Duration::from_secs(60), Duration::from_millis(50));

    action(1).await.unwrap();
    // Within the period: rejected at the outermost layer, still Ok.
    action(1).await.unwrap();

    sleep(Duration::from_millis(50)).await;
    assert_eq!(probe.base_calls.load(Ordering::SeqCst), 1);
    assert_eq!(probe.exceeded.load(Ordering::SeqCst), 1);
    assert_eq!(probe.last_wait_secs.load(Ordering::SeqCst), 60);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_burst_admits_one_and_notifies_the_rest() {
    let probe = Probe::new();
    let action = composed(&probe, 1, Duration::from_secs(60), Duration::from_millis(10));

    let (a, b, c) = tokio::join!(action(7), action(7), action(7));
    a.unwrap();
    b.unwrap();
    c.unwrap();

    sleep(Duration::from_millis(50)).await;
    assert_eq!(probe.base_calls.load(Ordering::SeqCst), 1);
    assert_eq!(probe.exceeded.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_admitted_calls_for_distinct_keys_are_serialized_by_the_queue() {
    // Generous limit so the queue layer is the only thing serializing.
    let probe = Probe::new();
    let action = composed(
        &probe,
        100,
        Duration::from_secs(60),
        Duration::from_millis(60),
    );

    let (a, b, c) = tokio::join!(action(1), action(2), action(3));
    a.unwrap();
    b.unwrap();
    c.unwrap();

    assert_eq!(probe.base_calls.load(Ordering::SeqCst), 3);
    assert_eq!(probe.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failure_of_one_queued_call_spares_the_next() {
    let queue = Arc::new(TaskQueue::new());

    let failing = queue.run(QueueKey::named("shared"), async {
        Err(magpie_core::Error::Render("renderer down".to_string()).into())
    });
    let fine = queue.run(QueueKey::named("shared"), async { Ok(()) });

    let (first, second) = tokio::join!(failing, fine);
    assert!(first.unwrap_err().to_string().contains("renderer down"));
    second.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rate_limit_reopens_after_period() {
    let probe = Probe::new();
    let action = composed(
        &probe,
        1,
        Duration::from_millis(100),
        Duration::from_millis(5),
    );

    action(1).await.unwrap();
    action(1).await.unwrap();
    assert_eq!(probe.base_calls.load(Ordering::SeqCst), 1);

    sleep(Duration::from_millis(150)).await;
    action(1).await.unwrap();
    assert_eq!(probe.base_calls.load(Ordering::SeqCst), 2);
}
