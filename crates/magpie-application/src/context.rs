//! Application assembly and lifecycle
//!
//! [`AppContext`] wires the ports into the watchdog, dispatcher, and
//! handlers, and owns their lifecycle: `start` registers and spawns
//! everything, `apply_config` hot-reloads what can change at runtime, and
//! `shutdown` stops the loops and scheduled jobs in reverse order.

use crate::handlers::{RankHandler, WordCloudHandler};
use crate::services::{Dispatcher, GroupHandler, HeartbeatWatchdog, WatchdogState};
use crate::{Error, Result};
use magpie_config::Config;
use magpie_ports::{
    CloudRendererRef, ConnectionSessionRef, MemberRosterRef, MessageSenderRef, MessageStoreRef,
    RankStoreRef, SchedulerRef,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

/// Assembled application: watchdog, dispatcher, and handlers over the ports
pub struct AppContext {
    config: RwLock<Config>,
    watchdog: Arc<HeartbeatWatchdog>,
    dispatcher: Dispatcher,
    rank: Arc<RankHandler>,
    word_cloud: Arc<WordCloudHandler>,
}

impl AppContext {
    /// Wire the application from configuration and port implementations.
    ///
    /// Fails when the configuration does not validate (bad filter regexes
    /// included); nothing is spawned until [`start`](Self::start).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        session: ConnectionSessionRef,
        sender: MessageSenderRef,
        roster: MemberRosterRef,
        rank_store: RankStoreRef,
        message_store: MessageStoreRef,
        renderer: CloudRendererRef,
        scheduler: SchedulerRef,
    ) -> Result<Self> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(Error::invalid_config("config", errors.join("; ")));
        }

        let watchdog = Arc::new(HeartbeatWatchdog::new(
            Arc::clone(&session),
            config.connection.http_api,
            Duration::from_millis(config.connection.heartbeat_grace_ms),
        ));
        let dispatcher = Dispatcher::new(Arc::clone(&session), Arc::clone(&watchdog));

        let rank = Arc::new(RankHandler::new(
            config.handlers.rank.clone(),
            Arc::clone(&sender),
            roster,
            rank_store,
            Arc::clone(&scheduler),
        ));
        let word_cloud = Arc::new(WordCloudHandler::new(
            config.handlers.word_cloud.clone(),
            sender,
            message_store,
            renderer,
            scheduler,
        )?);

        Ok(Self {
            config: RwLock::new(config),
            watchdog,
            dispatcher,
            rank,
            word_cloud,
        })
    }

    /// Register handlers, spawn the loops, and schedule the daily jobs.
    pub async fn start(&self) -> Result<()> {
        let rank: Arc<dyn GroupHandler> = self.rank.clone();
        let word_cloud: Arc<dyn GroupHandler> = self.word_cloud.clone();
        self.dispatcher.register(rank).await;
        self.dispatcher.register(word_cloud).await;

        self.watchdog.start().await;
        self.dispatcher.start().await;

        self.rank.schedule_daily().await?;
        self.word_cloud.schedule_daily().await?;

        info!("Application started");
        Ok(())
    }

    /// Apply a new configuration without restarting.
    ///
    /// Connection settings cannot be hot-applied: a change there is rejected
    /// with [`Error::RestartRequired`] and nothing else is touched. Handler
    /// settings update in place; changed cron specs replace the daily jobs
    /// through their slots.
    pub async fn apply_config(&self, new: Config) -> Result<()> {
        {
            let current = self.config.read().await;
            if current.connection != new.connection {
                return Err(Error::RestartRequired("connection".to_string()));
            }
        }

        self.rank.apply_config(new.handlers.rank.clone()).await?;
        self.word_cloud
            .apply_config(new.handlers.word_cloud.clone())
            .await?;

        *self.config.write().await = new;
        info!("Configuration applied");
        Ok(())
    }

    /// Current watchdog liveness state
    pub fn watchdog_state(&self) -> WatchdogState {
        self.watchdog.state()
    }

    /// Stop loops and scheduled jobs; waits for the tasks to exit.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
        self.watchdog.shutdown().await;
        self.rank.shutdown().await;
        self.word_cloud.shutdown().await;
        info!("Application stopped");
    }
}
