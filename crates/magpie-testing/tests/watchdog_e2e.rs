//! End-to-end tests for the heartbeat watchdog
//!
//! Timings are scaled down (tens of milliseconds) with generous margins.
//! Confirming heartbeats declare a long interval so a recovered watchdog
//! does not stall again inside the test window.

use magpie_application::{HeartbeatWatchdog, WatchdogState};
use magpie_testing::{fixtures, MockConnectionSession};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const LONG_INTERVAL_MS: i64 = 60_000;

async fn wait_for_state(watchdog: &HeartbeatWatchdog, state: WatchdogState) {
    for _ in 0..200 {
        if watchdog.state() == state {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "watchdog never reached {:?}, still {:?}",
        state,
        watchdog.state()
    );
}

fn watchdog(session: &Arc<MockConnectionSession>, http_api: bool) -> HeartbeatWatchdog {
    magpie_logging::init_test();
    HeartbeatWatchdog::new(session.clone(), http_api, Duration::ZERO)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_idle_until_first_heartbeat() {
    let session = Arc::new(MockConnectionSession::new());
    let dog = watchdog(&session, false);
    dog.start().await;

    sleep(Duration::from_millis(100)).await;
    assert_eq!(dog.state(), WatchdogState::Idle);
    assert_eq!(dog.stall_count(), 0);

    dog.observe(fixtures::sample_heartbeat(LONG_INTERVAL_MS));
    wait_for_state(&dog, WatchdogState::Armed).await;

    dog.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_on_time_heartbeats_never_stall() {
    let session = Arc::new(MockConnectionSession::new());
    let dog = watchdog(&session, false);
    dog.start().await;

    // Declared interval 100ms, delivered every 50ms.
    for _ in 0..6 {
        dog.observe(fixtures::sample_heartbeat(100));
        sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(dog.state(), WatchdogState::Armed);
    assert_eq!(dog.stall_count(), 0);
    assert_eq!(session.events_resubscribe_count(), 0);
    assert_eq!(session.api_resubscribe_count(), 0);

    dog.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stall_resubscribes_exactly_once() {
    let session = Arc::new(MockConnectionSession::new());
    let dog = watchdog(&session, false);
    dog.start().await;

    dog.observe(fixtures::sample_heartbeat(50));
    wait_for_state(&dog, WatchdogState::Stalled).await;

    assert_eq!(dog.stall_count(), 1);
    assert_eq!(session.events_resubscribe_count(), 1);
    assert_eq!(session.api_resubscribe_count(), 1);

    // Staying stalled (well past another interval) must not resubscribe again.
    sleep(Duration::from_millis(300)).await;
    assert_eq!(dog.state(), WatchdogState::Stalled);
    assert_eq!(session.events_resubscribe_count(), 1);
    assert_eq!(session.api_resubscribe_count(), 1);

    dog.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_heartbeat_on_the_stream_confirms_recovery() {
    let session = Arc::new(MockConnectionSession::new());
    let dog = watchdog(&session, false);
    dog.start().await;

    dog.observe(fixtures::sample_heartbeat(50));
    wait_for_state(&dog, WatchdogState::Stalled).await;

    session.emit(fixtures::heartbeat(LONG_INTERVAL_MS));
    wait_for_state(&dog, WatchdogState::Armed).await;
    assert_eq!(dog.recovery_count(), 1);

    dog.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_non_heartbeat_events_do_not_confirm() {
    let session = Arc::new(MockConnectionSession::new());
    let dog = watchdog(&session, false);
    dog.start().await;

    dog.observe(fixtures::sample_heartbeat(50));
    wait_for_state(&dog, WatchdogState::Stalled).await;

    session.emit(fixtures::group_text(1001, 1, "not a heartbeat"));
    sleep(Duration::from_millis(100)).await;
    assert_eq!(dog.state(), WatchdogState::Stalled);
    assert_eq!(dog.recovery_count(), 0);

    session.emit(fixtures::heartbeat(LONG_INTERVAL_MS));
    wait_for_state(&dog, WatchdogState::Armed).await;

    dog.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_http_api_mode_skips_api_resubscription() {
    let session = Arc::new(MockConnectionSession::new());
    let dog = watchdog(&session, true);
    dog.start().await;

    dog.observe(fixtures::sample_heartbeat(50));
    wait_for_state(&dog, WatchdogState::Stalled).await;

    assert_eq!(session.events_resubscribe_count(), 1);
    assert_eq!(session.api_resubscribe_count(), 0);

    dog.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_resubscription_failure_keeps_waiting_for_confirmation() {
    let session = Arc::new(MockConnectionSession::new());
    session.set_fail_resubscribe(true);
    let dog = watchdog(&session, false);
    dog.start().await;

    dog.observe(fixtures::sample_heartbeat(50));
    wait_for_state(&dog, WatchdogState::Stalled).await;
    assert_eq!(session.events_resubscribe_count(), 1);

    // Recovery still happens once a heartbeat arrives, without retrying the
    // resubscription.
    session.set_fail_resubscribe(false);
    session.emit(fixtures::heartbeat(LONG_INTERVAL_MS));
    wait_for_state(&dog, WatchdogState::Armed).await;
    assert_eq!(session.events_resubscribe_count(), 1);
    assert_eq!(dog.recovery_count(), 1);

    dog.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_grace_margin_extends_the_deadline() {
    let session = Arc::new(MockConnectionSession::new());
    let dog = HeartbeatWatchdog::new(
        session.clone(),
        false,
        Duration::from_millis(300),
    );
    dog.start().await;

    dog.observe(fixtures::sample_heartbeat(100));
    wait_for_state(&dog, WatchdogState::Armed).await;

    // Past the declared interval but inside the grace margin.
    sleep(Duration::from_millis(200)).await;
    assert_eq!(dog.state(), WatchdogState::Armed);
    assert_eq!(dog.stall_count(), 0);

    wait_for_state(&dog, WatchdogState::Stalled).await;
    assert_eq!(dog.stall_count(), 1);

    dog.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_repeated_stall_recover_cycles_count_each_once() {
    let session = Arc::new(MockConnectionSession::new());
    let dog = watchdog(&session, false);
    dog.start().await;

    dog.observe(fixtures::sample_heartbeat(50));
    wait_for_state(&dog, WatchdogState::Stalled).await;
    // Recover with a short interval so silence stalls it again.
    session.emit(fixtures::heartbeat(50));
    wait_for_state(&dog, WatchdogState::Armed).await;

    wait_for_state(&dog, WatchdogState::Stalled).await;
    session.emit(fixtures::heartbeat(LONG_INTERVAL_MS));
    wait_for_state(&dog, WatchdogState::Armed).await;

    assert_eq!(dog.stall_count(), 2);
    assert_eq!(dog.recovery_count(), 2);
    assert_eq!(session.events_resubscribe_count(), 2);
    assert_eq!(session.api_resubscribe_count(), 2);

    dog.shutdown().await;
}
