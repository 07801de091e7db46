//! Event dispatch loop
//!
//! One task taps the session's broadcast stream and routes by event class:
//! heartbeats feed the watchdog, group messages fan out to every registered
//! handler in registration order. A handler failure is logged against that
//! handler and message; it never stops the loop or starves the other
//! handlers.

use super::watchdog::HeartbeatWatchdog;
use crate::Result;
use async_trait::async_trait;
use magpie_core::event::{Event, GroupMessage};
use magpie_ports::ConnectionSessionRef;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A feature handler fed every inbound group message
#[async_trait]
pub trait GroupHandler: Send + Sync {
    /// Handler name for logs
    fn name(&self) -> &str;

    /// Process one group message.
    ///
    /// Called for every message in every group; the handler does its own
    /// group and command gating.
    async fn handle_message(&self, message: &GroupMessage) -> Result<()>;
}

/// Routes inbound events to the watchdog and registered handlers
pub struct Dispatcher {
    session: ConnectionSessionRef,
    watchdog: Arc<HeartbeatWatchdog>,
    handlers: Mutex<Vec<Arc<dyn GroupHandler>>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Create a dispatcher over `session`, feeding heartbeats to `watchdog`
    pub fn new(session: ConnectionSessionRef, watchdog: Arc<HeartbeatWatchdog>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            session,
            watchdog,
            handlers: Mutex::new(Vec::new()),
            shutdown_tx,
            shutdown_rx,
            handle: Mutex::new(None),
        }
    }

    /// Register a handler. Handlers run in registration order per message.
    pub async fn register(&self, handler: Arc<dyn GroupHandler>) {
        info!(handler = handler.name(), "Registering message handler");
        self.handlers.lock().await.push(handler);
    }

    /// Spawn the dispatch loop. Subsequent calls are no-ops.
    ///
    /// Handlers registered after start are not picked up; registration
    /// happens during assembly, before the loop runs.
    pub async fn start(&self) {
        let mut handle_slot = self.handle.lock().await;
        if handle_slot.is_some() {
            warn!("Dispatcher already started");
            return;
        }

        let receiver = self.session.subscribe();
        let handlers = self.handlers.lock().await.clone();
        let watchdog = Arc::clone(&self.watchdog);
        let shutdown_rx = self.shutdown_rx.clone();

        debug!(handlers = handlers.len(), "Dispatcher started");
        *handle_slot = Some(tokio::spawn(Self::run(
            receiver,
            handlers,
            watchdog,
            shutdown_rx,
        )));
    }

    /// Stop the dispatch loop and wait for it to exit.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.handle.lock().await.take() {
            let _ = task.await;
        }
        debug!("Dispatcher stopped");
    }

    async fn run(
        mut receiver: broadcast::Receiver<Event>,
        handlers: Vec<Arc<dyn GroupHandler>>,
        watchdog: Arc<HeartbeatWatchdog>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                event = receiver.recv() => match event {
                    Ok(Event::Heartbeat(heartbeat)) => {
                        watchdog.observe(heartbeat);
                    }
                    Ok(Event::GroupMessage(message)) => {
                        Self::dispatch_message(&handlers, &message).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Dispatcher lagged behind the event stream");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Event stream closed, dispatcher exiting");
                        return;
                    }
                },
                _ = shutdown_rx.changed() => return,
            }
        }
    }

    async fn dispatch_message(handlers: &[Arc<dyn GroupHandler>], message: &GroupMessage) {
        for handler in handlers {
            if let Err(err) = handler.handle_message(message).await {
                error!(
                    handler = handler.name(),
                    group_id = %message.group_id,
                    error = %err,
                    "Handler failed for message"
                );
            }
        }
    }
}
