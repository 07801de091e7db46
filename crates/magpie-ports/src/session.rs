//! Connection session port
//!
//! The session owns the realtime platform connection. The core never opens
//! or closes it; the watchdog only asks it to re-establish delivery after a
//! suspected stall, and every consumer taps the same broadcast stream.

use async_trait::async_trait;
use magpie_core::error::Result;
use magpie_core::Event;
use tokio::sync::broadcast;

/// The realtime platform connection, consumed (not owned) by the core
#[async_trait]
pub trait ConnectionSession: Send + Sync {
    /// Subscribe to the shared inbound event stream.
    ///
    /// Every receiver sees every event; attaching or detaching a receiver
    /// never affects delivery to the others.
    fn subscribe(&self) -> broadcast::Receiver<Event>;

    /// Re-establish event delivery after a suspected disconnection.
    ///
    /// Idempotent on the session side; safe to call while delivery is
    /// actually healthy.
    async fn resubscribe_events(&self) -> Result<()>;

    /// Re-establish the request/response channel.
    ///
    /// Only invoked when the process drives requests over the realtime
    /// connection; skipped entirely in HTTP-API mode.
    async fn resubscribe_api(&self) -> Result<()>;
}
