//! Mock connection session
//!
//! Backs the session port with a broadcast channel the test drives
//! directly. Resubscription attempts are counted (including failed ones)
//! and can be made to fail on demand.

use async_trait::async_trait;
use magpie_core::error::{Error, Result};
use magpie_core::Event;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast;

/// A mock connection session driven by the test
pub struct MockConnectionSession {
    tx: broadcast::Sender<Event>,
    events_resubscribed: AtomicU64,
    api_resubscribed: AtomicU64,
    fail_resubscribe: AtomicBool,
}

impl Default for MockConnectionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnectionSession {
    /// Create a session with a fresh event channel
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            tx,
            events_resubscribed: AtomicU64::new(0),
            api_resubscribed: AtomicU64::new(0),
            fail_resubscribe: AtomicBool::new(false),
        }
    }

    /// Emit an event to every current subscriber.
    ///
    /// An event emitted while nobody is subscribed is silently dropped,
    /// matching a broadcast stream with no receivers.
    pub fn emit(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Number of event-stream resubscription attempts observed
    pub fn events_resubscribe_count(&self) -> u64 {
        self.events_resubscribed.load(Ordering::SeqCst)
    }

    /// Number of request-channel resubscription attempts observed
    pub fn api_resubscribe_count(&self) -> u64 {
        self.api_resubscribed.load(Ordering::SeqCst)
    }

    /// Make subsequent resubscription attempts fail (or succeed again)
    pub fn set_fail_resubscribe(&self, fail: bool) {
        self.fail_resubscribe.store(fail, Ordering::SeqCst);
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl magpie_ports::ConnectionSession for MockConnectionSession {
    fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    async fn resubscribe_events(&self) -> Result<()> {
        self.events_resubscribed.fetch_add(1, Ordering::SeqCst);
        if self.fail_resubscribe.load(Ordering::SeqCst) {
            return Err(Error::ResubscribeEvents("mock failure".to_string()));
        }
        Ok(())
    }

    async fn resubscribe_api(&self) -> Result<()> {
        self.api_resubscribed.fetch_add(1, Ordering::SeqCst);
        if self.fail_resubscribe.load(Ordering::SeqCst) {
            return Err(Error::ResubscribeApi("mock failure".to_string()));
        }
        Ok(())
    }
}
