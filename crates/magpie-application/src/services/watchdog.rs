//! Heartbeat watchdog for the realtime connection
//!
//! The platform declares, on every heartbeat, how long until the next one.
//! The watchdog arms a deadline of `interval + grace` after each observed
//! heartbeat; if the deadline passes it declares a stall, asks the session
//! to re-establish delivery exactly once, and waits for a confirming
//! heartbeat before re-arming. Repeated deadline expiry while already
//! stalled never triggers a second resubscription for the same stall.
//!
//! The confirmation listener is attached to the session stream before the
//! resubscription calls go out, so a heartbeat arriving mid-recovery cannot
//! be missed. It is detached as soon as the first heartbeat confirms
//! recovery.

use magpie_core::event::{Event, Heartbeat};
use magpie_ports::ConnectionSessionRef;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// Liveness state of the monitored connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    /// No heartbeat observed yet; no deadline armed
    Idle,
    /// Heartbeats arriving on time; a deadline is armed
    Armed,
    /// Deadline expired; recovery issued, awaiting a confirming heartbeat
    Stalled,
}

impl WatchdogState {
    fn as_u8(self) -> u8 {
        match self {
            WatchdogState::Idle => 0,
            WatchdogState::Armed => 1,
            WatchdogState::Stalled => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => WatchdogState::Armed,
            2 => WatchdogState::Stalled,
            _ => WatchdogState::Idle,
        }
    }
}

impl std::fmt::Display for WatchdogState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WatchdogState::Idle => "idle",
            WatchdogState::Armed => "armed",
            WatchdogState::Stalled => "stalled",
        };
        write!(f, "{}", name)
    }
}

struct WatchdogInner {
    session: ConnectionSessionRef,
    http_api: bool,
    grace: Duration,
    state: AtomicU8,
    stalls: AtomicU64,
    recoveries: AtomicU64,
}

impl WatchdogInner {
    fn set_state(&self, state: WatchdogState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }
}

/// Monitors heartbeat cadence and drives session recovery on stalls
pub struct HeartbeatWatchdog {
    inner: Arc<WatchdogInner>,
    observe_tx: mpsc::UnboundedSender<Heartbeat>,
    observe_rx: Mutex<Option<mpsc::UnboundedReceiver<Heartbeat>>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl HeartbeatWatchdog {
    /// Create a watchdog over `session`.
    ///
    /// `http_api` indicates requests are driven over HTTP rather than the
    /// realtime connection; in that mode only event delivery is
    /// re-established on a stall.
    pub fn new(session: ConnectionSessionRef, http_api: bool, grace: Duration) -> Self {
        let (observe_tx, observe_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            inner: Arc::new(WatchdogInner {
                session,
                http_api,
                grace,
                state: AtomicU8::new(WatchdogState::Idle.as_u8()),
                stalls: AtomicU64::new(0),
                recoveries: AtomicU64::new(0),
            }),
            observe_tx,
            observe_rx: Mutex::new(Some(observe_rx)),
            shutdown_tx,
            shutdown_rx,
            handle: Mutex::new(None),
        }
    }

    /// Feed an observed heartbeat into the watchdog.
    ///
    /// Never blocks; the monitor task consumes observations on its own
    /// schedule.
    pub fn observe(&self, heartbeat: Heartbeat) {
        // The receiver only closes on shutdown; a late observation then is
        // harmless.
        let _ = self.observe_tx.send(heartbeat);
    }

    /// Current liveness state
    pub fn state(&self) -> WatchdogState {
        WatchdogState::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    /// Number of stalls declared since start
    pub fn stall_count(&self) -> u64 {
        self.inner.stalls.load(Ordering::SeqCst)
    }

    /// Number of confirmed recoveries since start
    pub fn recovery_count(&self) -> u64 {
        self.inner.recoveries.load(Ordering::SeqCst)
    }

    /// Spawn the monitor task. Subsequent calls are no-ops.
    pub async fn start(&self) {
        let mut rx_slot = self.observe_rx.lock().await;
        let observe_rx = match rx_slot.take() {
            Some(rx) => rx,
            None => {
                warn!("Heartbeat watchdog already started");
                return;
            }
        };
        drop(rx_slot);

        let inner = Arc::clone(&self.inner);
        let shutdown_rx = self.shutdown_rx.clone();
        let task = tokio::spawn(Self::run(inner, observe_rx, shutdown_rx));
        *self.handle.lock().await = Some(task);
        debug!(grace_ms = self.inner.grace.as_millis() as u64, "Heartbeat watchdog started");
    }

    /// Stop the monitor task and wait for it to exit.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.handle.lock().await.take() {
            let _ = task.await;
        }
        debug!("Heartbeat watchdog stopped");
    }

    async fn run(
        inner: Arc<WatchdogInner>,
        mut observe_rx: mpsc::UnboundedReceiver<Heartbeat>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        // Idle until the first heartbeat declares an interval.
        let mut interval = tokio::select! {
            observed = observe_rx.recv() => match observed {
                Some(heartbeat) => heartbeat.interval(),
                None => return,
            },
            _ = shutdown_rx.changed() => return,
        };
        inner.set_state(WatchdogState::Armed);
        info!(interval_ms = interval.as_millis() as u64, "First heartbeat observed, watchdog armed");

        loop {
            let deadline = Instant::now() + interval + inner.grace;
            tokio::select! {
                observed = observe_rx.recv() => match observed {
                    Some(heartbeat) => {
                        interval = heartbeat.interval();
                    }
                    None => return,
                },
                _ = sleep_until(deadline) => {
                    match Self::recover(&inner, &mut shutdown_rx).await {
                        Some(confirmed_interval) => interval = confirmed_interval,
                        None => return,
                    }
                }
                _ = shutdown_rx.changed() => return,
            }
        }
    }

    /// Declare a stall, re-establish delivery once, and wait for the
    /// confirming heartbeat. Returns its declared interval, or `None` when
    /// shut down mid-recovery.
    async fn recover(
        inner: &Arc<WatchdogInner>,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> Option<Duration> {
        inner.set_state(WatchdogState::Stalled);
        let stall = inner.stalls.fetch_add(1, Ordering::SeqCst) + 1;
        warn!(stall, "Heartbeat deadline expired, resubscribing");

        // Attach before resubscribing so the confirmation cannot race past.
        let mut listener = inner.session.subscribe();

        if let Err(err) = inner.session.resubscribe_events().await {
            error!(error = %err, "Event stream resubscription failed");
        }
        if !inner.http_api {
            if let Err(err) = inner.session.resubscribe_api().await {
                error!(error = %err, "Request channel resubscription failed");
            }
        }

        loop {
            tokio::select! {
                event = listener.recv() => match event {
                    Ok(Event::Heartbeat(heartbeat)) => {
                        inner.set_state(WatchdogState::Armed);
                        inner.recoveries.fetch_add(1, Ordering::SeqCst);
                        info!(
                            interval_ms = heartbeat.interval_ms,
                            "Heartbeat confirmed after resubscription, watchdog re-armed"
                        );
                        // Dropping the listener detaches the one-shot
                        // confirmation tap.
                        return Some(heartbeat.interval());
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Confirmation listener lagged behind the event stream");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        error!("Event stream closed while awaiting heartbeat confirmation");
                        return None;
                    }
                },
                _ = shutdown_rx.changed() => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip() {
        for state in [
            WatchdogState::Idle,
            WatchdogState::Armed,
            WatchdogState::Stalled,
        ] {
            assert_eq!(WatchdogState::from_u8(state.as_u8()), state);
        }
    }

    #[test]
    fn test_state_display() {
        assert_eq!(WatchdogState::Idle.to_string(), "idle");
        assert_eq!(WatchdogState::Armed.to_string(), "armed");
        assert_eq!(WatchdogState::Stalled.to_string(), "stalled");
    }
}
