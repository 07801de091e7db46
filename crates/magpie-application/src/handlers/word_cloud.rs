//! Daily word-cloud handler
//!
//! Collects message text per group (minus configured filter patterns) and
//! turns it into a rendered image on demand or on a daily schedule. Render
//! work is both rate limited (outermost, per group) and serialized through
//! a task queue (innermost), so an over-limit request never occupies a
//! queue slot and renders never overlap.
//!
//! When rendering or sending fails, the day's collected text is written to
//! a timestamped backup file so the content survives the failure.

use crate::middleware::{
    QueueKey, RateLimitLayer, RateLimitPolicy, RateLimiter, TaskQueue, TaskQueueLayer, Wrap,
};
use crate::services::{GroupHandler, JobSlot};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Local;
use magpie_config::WordCloudConfig;
use magpie_core::event::GroupMessage;
use magpie_core::GroupId;
use magpie_ports::{CloudRendererRef, MessageSenderRef, MessageStoreRef, SchedulerRef};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

type DeliverAction = crate::middleware::Action<GroupId>;

struct CloudCore {
    sender: MessageSenderRef,
    store: MessageStoreRef,
    renderer: CloudRendererRef,
    settings: RwLock<WordCloudConfig>,
    filters: RwLock<Vec<Regex>>,
    limit: AtomicU32,
    period_ms: AtomicU64,
}

/// Word-cloud handler over the message store, renderer, and sender ports
pub struct WordCloudHandler {
    core: Arc<CloudCore>,
    deliver: DeliverAction,
    queue: Arc<TaskQueue>,
    scheduler: SchedulerRef,
    job_slot: JobSlot,
}

impl WordCloudHandler {
    /// Create the handler from its configuration and ports.
    ///
    /// Fails when a filter pattern does not compile.
    pub fn new(
        config: WordCloudConfig,
        sender: MessageSenderRef,
        store: MessageStoreRef,
        renderer: CloudRendererRef,
        scheduler: SchedulerRef,
    ) -> Result<Self> {
        let filters = compile_filters(&config.filter_patterns)?;
        let core = Arc::new(CloudCore {
            sender,
            store,
            renderer,
            filters: RwLock::new(filters),
            limit: AtomicU32::new(config.rate_limit),
            period_ms: AtomicU64::new(config.rate_period_ms),
            settings: RwLock::new(config),
        });

        let queue = Arc::new(TaskQueue::new());
        let deliver = Self::build_deliver(&core, &queue);

        Ok(Self {
            core,
            deliver,
            queue,
            scheduler,
            job_slot: JobSlot::new(),
        })
    }

    fn build_deliver(core: &Arc<CloudCore>, queue: &Arc<TaskQueue>) -> DeliverAction {
        let limit_core = Arc::clone(core);
        let period_core = Arc::clone(core);
        let exceed_core = Arc::clone(core);
        let policy = RateLimitPolicy {
            key: Arc::new(|group: &GroupId| format!("word_cloud:{}", group)),
            limit: Arc::new(move |_| limit_core.limit.load(Ordering::SeqCst)),
            period: Arc::new(move |_| {
                Duration::from_millis(period_core.period_ms.load(Ordering::SeqCst))
            }),
            exceed_action: Arc::new(move |group: GroupId, wait_secs| {
                let core = Arc::clone(&exceed_core);
                Box::pin(async move {
                    let text =
                        format!("Word cloud is cooling down, try again in {}s", wait_secs);
                    if let Err(err) = core.sender.send_group_text(group, &text).await {
                        warn!(group_id = %group, error = %err, "Rate-limit notice failed to send");
                    }
                })
            }),
        };

        // Rate limit outermost: an over-limit request never reaches the queue.
        let base_core = Arc::clone(core);
        Wrap::new(move |group: GroupId| {
            let core = Arc::clone(&base_core);
            async move { deliver_cloud(&core, group).await }
        })
        .with(RateLimitLayer::new(Arc::new(RateLimiter::new()), policy))
        .with(TaskQueueLayer::new(Arc::clone(queue)))
        .build()
    }

    /// Install (or replace) the daily cloud job per the current cron spec.
    pub async fn schedule_daily(&self) -> Result<()> {
        let settings = self.core.settings.read().await.clone();
        if !settings.enabled {
            self.job_slot.clear().await;
            return Ok(());
        }

        let core = Arc::clone(&self.core);
        let queue = Arc::clone(&self.queue);
        let job: magpie_ports::JobFn = Arc::new(move || {
            let core = Arc::clone(&core);
            let queue = Arc::clone(&queue);
            Box::pin(async move { daily_tick(&core, &queue).await })
        });
        let handle = self.scheduler.schedule(&settings.daily_cron, job)?;
        self.job_slot.replace(handle).await;
        info!(cron = %settings.daily_cron, "Daily word-cloud job scheduled");
        Ok(())
    }

    /// Apply a new configuration without a restart.
    pub async fn apply_config(&self, new: WordCloudConfig) -> Result<()> {
        let errors = new.validate();
        if !errors.is_empty() {
            return Err(Error::invalid_config(
                "handlers.word_cloud",
                errors.join("; "),
            ));
        }
        let filters = compile_filters(&new.filter_patterns)?;

        let reschedule = {
            let mut settings = self.core.settings.write().await;
            let reschedule =
                settings.daily_cron != new.daily_cron || settings.enabled != new.enabled;
            self.core.limit.store(new.rate_limit, Ordering::SeqCst);
            self.core
                .period_ms
                .store(new.rate_period_ms, Ordering::SeqCst);
            *self.core.filters.write().await = filters;
            *settings = new;
            reschedule
        };

        if reschedule {
            self.schedule_daily().await?;
        }
        Ok(())
    }

    /// Stop the daily job.
    pub async fn shutdown(&self) {
        self.job_slot.clear().await;
    }
}

#[async_trait]
impl GroupHandler for WordCloudHandler {
    fn name(&self) -> &str {
        "word_cloud"
    }

    async fn handle_message(&self, message: &GroupMessage) -> Result<()> {
        let (serves, command) = {
            let settings = self.core.settings.read().await;
            (
                settings.enabled && settings.groups.contains(&message.group_id.value()),
                settings.command.clone(),
            )
        };
        if !serves {
            return Ok(());
        }

        let text = message.plain_text();
        if text == command {
            return (self.deliver)(message.group_id).await;
        }

        if text.is_empty() || self.is_filtered(&text).await {
            return Ok(());
        }
        self.core
            .store
            .record_text(message.group_id, &text)
            .await?;
        Ok(())
    }
}

impl WordCloudHandler {
    async fn is_filtered(&self, text: &str) -> bool {
        self.core
            .filters
            .read()
            .await
            .iter()
            .any(|filter| filter.is_match(text))
    }
}

fn compile_filters(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|err| {
                Error::invalid_config(
                    "handlers.word_cloud.filter_patterns",
                    format!("{:?}: {}", pattern, err),
                )
            })
        })
        .collect()
}

/// Render the day's texts and send the image; back up the text on failure.
async fn deliver_cloud(core: &Arc<CloudCore>, group: GroupId) -> Result<()> {
    let texts = core.store.texts(group).await?;
    if texts.is_empty() {
        core.sender
            .send_group_text(group, "No messages collected yet.")
            .await?;
        return Ok(());
    }

    let delivery = async {
        let png = core.renderer.render(&texts).await?;
        core.sender.send_group_image(group, &png).await?;
        Ok::<(), magpie_core::Error>(())
    };

    if let Err(err) = delivery.await {
        let backup_dir = core.settings.read().await.backup_dir.clone();
        match write_backup(&backup_dir, group, &texts) {
            Ok(path) => {
                warn!(group_id = %group, path = %path.display(), "Cloud delivery failed, text backed up")
            }
            Err(backup_err) => {
                error!(group_id = %group, error = %backup_err, "Cloud delivery failed and backup write failed")
            }
        }
        return Err(err.into());
    }
    Ok(())
}

/// Write the collected texts to a timestamped file under `dir`.
fn write_backup(dir: &Path, group: GroupId, texts: &[String]) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("word_cloud_{}_{}.txt", group, stamp));

    std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::write(&path, texts.join("\n")))
        .map_err(|err| Error::backup(&path, err.to_string()))?;
    Ok(path)
}

/// One daily tick: deliver and clear each served group through the queue,
/// so a scheduled render never overlaps an on-demand one.
async fn daily_tick(core: &Arc<CloudCore>, queue: &Arc<TaskQueue>) {
    let groups: Vec<GroupId> = core
        .settings
        .read()
        .await
        .groups
        .iter()
        .map(|&id| GroupId::new(id))
        .collect();

    for group in groups {
        let core = Arc::clone(core);
        let outcome = queue
            .run(QueueKey::Default, async move {
                deliver_cloud(&core, group).await?;
                core.store.clear(group).await?;
                Ok(())
            })
            .await;
        if let Err(err) = outcome {
            error!(group_id = %group, error = %err, "Daily word cloud failed, keeping texts");
        }
    }
}
