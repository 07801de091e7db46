//! Group activity ranking handler
//!
//! Counts one interaction per inbound message and serves a ranking report
//! on demand (rate limited per group) and on a daily schedule. The daily
//! job clears the day's rows only after the report went out, so a failed
//! send keeps the data for the next attempt.

use crate::middleware::{RateLimitLayer, RateLimitPolicy, RateLimiter, Wrap};
use crate::services::{GroupHandler, JobSlot};
use crate::{Error, Result};
use async_trait::async_trait;
use magpie_config::RankConfig;
use magpie_core::event::GroupMessage;
use magpie_core::{GroupId, UserId};
use magpie_ports::{
    MemberRosterRef, MessageSenderRef, RankStoreRef, SchedulerRef, UserCount,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Action argument alias kept local to the handlers
type ReportAction = crate::middleware::Action<GroupId>;

struct RankCore {
    sender: MessageSenderRef,
    roster: MemberRosterRef,
    store: RankStoreRef,
    settings: RwLock<RankConfig>,
    // Mirrors of the rate-limit settings, readable from sync policy accessors
    limit: AtomicU32,
    period_ms: AtomicU64,
}

/// Ranking handler over the rank store, roster, and sender ports
pub struct RankHandler {
    core: Arc<RankCore>,
    report: ReportAction,
    scheduler: SchedulerRef,
    job_slot: JobSlot,
}

impl RankHandler {
    /// Create the handler from its configuration and ports.
    ///
    /// The on-demand report is wrapped in a per-group rate limit; the limit
    /// and period follow later `apply_config` calls without rebuilding the
    /// wrapped action.
    pub fn new(
        config: RankConfig,
        sender: MessageSenderRef,
        roster: MemberRosterRef,
        store: RankStoreRef,
        scheduler: SchedulerRef,
    ) -> Self {
        let core = Arc::new(RankCore {
            sender,
            roster,
            store,
            limit: AtomicU32::new(config.rate_limit),
            period_ms: AtomicU64::new(config.rate_period_ms),
            settings: RwLock::new(config),
        });

        let report = Self::build_report(&core);

        Self {
            core,
            report,
            scheduler,
            job_slot: JobSlot::new(),
        }
    }

    fn build_report(core: &Arc<RankCore>) -> ReportAction {
        let limit_core = Arc::clone(core);
        let period_core = Arc::clone(core);
        let exceed_core = Arc::clone(core);
        let policy = RateLimitPolicy {
            key: Arc::new(|group: &GroupId| format!("rank:{}", group)),
            limit: Arc::new(move |_| limit_core.limit.load(Ordering::SeqCst)),
            period: Arc::new(move |_| {
                Duration::from_millis(period_core.period_ms.load(Ordering::SeqCst))
            }),
            exceed_action: Arc::new(move |group: GroupId, wait_secs| {
                let core = Arc::clone(&exceed_core);
                Box::pin(async move {
                    let text = format!("Ranking is cooling down, try again in {}s", wait_secs);
                    if let Err(err) = core.sender.send_group_text(group, &text).await {
                        warn!(group_id = %group, error = %err, "Rate-limit notice failed to send");
                    }
                })
            }),
        };

        let base_core = Arc::clone(core);
        Wrap::new(move |group: GroupId| {
            let core = Arc::clone(&base_core);
            async move { send_report(&core, group).await }
        })
        .with(RateLimitLayer::new(Arc::new(RateLimiter::new()), policy))
        .build()
    }

    /// Install (or replace) the daily report job per the current cron spec.
    ///
    /// A disabled handler clears the slot instead.
    pub async fn schedule_daily(&self) -> Result<()> {
        let settings = self.core.settings.read().await.clone();
        if !settings.enabled {
            self.job_slot.clear().await;
            return Ok(());
        }

        let core = Arc::clone(&self.core);
        let job: magpie_ports::JobFn = Arc::new(move || {
            let core = Arc::clone(&core);
            Box::pin(async move { daily_tick(&core).await })
        });
        let handle = self.scheduler.schedule(&settings.daily_cron, job)?;
        self.job_slot.replace(handle).await;
        info!(cron = %settings.daily_cron, "Daily ranking job scheduled");
        Ok(())
    }

    /// Apply a new configuration without a restart.
    ///
    /// Rate-limit changes take effect on the next admission check; a changed
    /// cron spec or enabled flag reschedules the daily job through the slot.
    pub async fn apply_config(&self, new: RankConfig) -> Result<()> {
        let errors = new.validate();
        if !errors.is_empty() {
            return Err(Error::invalid_config("handlers.rank", errors.join("; ")));
        }

        let reschedule = {
            let mut settings = self.core.settings.write().await;
            let reschedule =
                settings.daily_cron != new.daily_cron || settings.enabled != new.enabled;
            self.core.limit.store(new.rate_limit, Ordering::SeqCst);
            self.core
                .period_ms
                .store(new.rate_period_ms, Ordering::SeqCst);
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
impl GroupHandler for RankHandler {
    fn name(&self) -> &str {
        "rank"
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

        self.core
            .store
            .record(message.group_id, message.user_id)
            .await?;

        if message.plain_text() == command {
            (self.report)(message.group_id).await?;
        }
        Ok(())
    }
}

/// Load counts, resolve names, and send the ranking to the group.
async fn send_report(core: &Arc<RankCore>, group: GroupId) -> Result<()> {
    let top_n = core.settings.read().await.top_n;
    let counts = core.store.counts(group).await?;

    if counts.is_empty() {
        core.sender
            .send_group_text(group, "No group activity recorded yet.")
            .await?;
        return Ok(());
    }

    // A roster failure degrades to raw ids rather than losing the report.
    let names: HashMap<UserId, String> = match core.roster.group_members(group).await {
        Ok(members) => members
            .into_iter()
            .map(|m| (m.user_id, m.display_name().to_string()))
            .collect(),
        Err(err) => {
            warn!(group_id = %group, error = %err, "Roster lookup failed, using raw ids");
            HashMap::new()
        }
    };

    let text = format_report(&counts, &names, top_n);
    core.sender.send_group_text(group, &text).await?;
    Ok(())
}

fn format_report(
    counts: &[UserCount],
    names: &HashMap<UserId, String>,
    top_n: usize,
) -> String {
    let mut lines = vec!["Today's activity ranking:".to_string()];
    for (position, row) in counts.iter().take(top_n).enumerate() {
        let name = names
            .get(&row.user_id)
            .cloned()
            .unwrap_or_else(|| row.user_id.to_string());
        lines.push(format!("{}. {} - {}", position + 1, name, row.count));
    }
    lines.join("\n")
}

/// One daily tick: report and clear each served group independently.
async fn daily_tick(core: &Arc<RankCore>) {
    let groups: Vec<GroupId> = core
        .settings
        .read()
        .await
        .groups
        .iter()
        .map(|&id| GroupId::new(id))
        .collect();

    for group in groups {
        match send_report(core, group).await {
            Ok(()) => {
                // Only discard the day's rows once the report went out.
                if let Err(err) = core.store.clear(group).await {
                    error!(group_id = %group, error = %err, "Failed to clear rank rows");
                }
            }
            Err(err) => {
                error!(group_id = %group, error = %err, "Daily ranking report failed, keeping rows");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(rows: &[(i64, u64)]) -> Vec<UserCount> {
        rows.iter()
            .map(|&(user, count)| UserCount {
                user_id: UserId::new(user),
                count,
            })
            .collect()
    }

    #[test]
    fn test_format_report_uses_names_and_positions() {
        let mut names = HashMap::new();
        names.insert(UserId::new(1), "alice".to_string());
        names.insert(UserId::new(2), "bob".to_string());

        let text = format_report(&counts(&[(1, 42), (2, 7)]), &names, 10);
        assert_eq!(
            text,
            "Today's activity ranking:\n1. alice - 42\n2. bob - 7"
        );
    }

    #[test]
    fn test_format_report_truncates_to_top_n() {
        let text = format_report(&counts(&[(1, 3), (2, 2), (3, 1)]), &HashMap::new(), 2);
        assert_eq!(text.lines().count(), 3);
        assert!(!text.contains("3. "));
    }

    #[test]
    fn test_format_report_falls_back_to_raw_id() {
        let text = format_report(&counts(&[(99, 5)]), &HashMap::new(), 10);
        assert!(text.contains("1. 99 - 5"));
    }
}
