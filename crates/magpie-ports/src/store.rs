//! Store ports for per-group accumulation
//!
//! Both stores accumulate between scheduled clears: the rank store counts
//! interactions per user, the message store collects raw text for the word
//! cloud. Persistence details (and whether anything survives a restart)
//! belong to the adapter.

use async_trait::async_trait;
use magpie_core::error::Result;
use magpie_core::{GroupId, UserId};

/// Per-user interaction count row (for ranking queries)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCount {
    /// The counted user
    pub user_id: UserId,
    /// Interactions recorded since the last clear
    pub count: u64,
}

/// Accumulates one row per observed group message, for activity ranking
#[async_trait]
pub trait RankStore: Send + Sync {
    /// Record one interaction for a user in a group
    async fn record(&self, group_id: GroupId, user_id: UserId) -> Result<()>;

    /// Per-user counts for a group since the last clear, descending by count
    async fn counts(&self, group_id: GroupId) -> Result<Vec<UserCount>>;

    /// Drop all rows for a group
    async fn clear(&self, group_id: GroupId) -> Result<()>;
}

/// Accumulates message text per group, for word-cloud rendering
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Record one message's plain text for a group
    async fn record_text(&self, group_id: GroupId, text: &str) -> Result<()>;

    /// All texts for a group since the last clear, in arrival order
    async fn texts(&self, group_id: GroupId) -> Result<Vec<String>>;

    /// Drop all texts for a group
    async fn clear(&self, group_id: GroupId) -> Result<()>;
}
