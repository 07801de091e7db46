//! In-memory store and renderer mocks

use async_trait::async_trait;
use magpie_core::error::{Error, Result};
use magpie_core::{GroupId, UserId};
use magpie_ports::{CloudRenderer, MessageStore, RankStore, UserCount};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

/// In-memory rank store
#[derive(Default)]
pub struct MockRankStore {
    rows: RwLock<HashMap<GroupId, HashMap<UserId, u64>>>,
}

impl MockRankStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Total interactions recorded for a group
    pub fn total(&self, group_id: GroupId) -> u64 {
        self.rows
            .read()
            .unwrap()
            .get(&group_id)
            .map(|users| users.values().sum())
            .unwrap_or(0)
    }
}

#[async_trait]
impl RankStore for MockRankStore {
    async fn record(&self, group_id: GroupId, user_id: UserId) -> Result<()> {
        *self
            .rows
            .write()
            .unwrap()
            .entry(group_id)
            .or_default()
            .entry(user_id)
            .or_insert(0) += 1;
        Ok(())
    }

    async fn counts(&self, group_id: GroupId) -> Result<Vec<UserCount>> {
        let mut counts: Vec<UserCount> = self
            .rows
            .read()
            .unwrap()
            .get(&group_id)
            .map(|users| {
                users
                    .iter()
                    .map(|(&user_id, &count)| UserCount { user_id, count })
                    .collect()
            })
            .unwrap_or_default();
        // Descending by count, user id as the deterministic tiebreak.
        counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.user_id.value().cmp(&b.user_id.value())));
        Ok(counts)
    }

    async fn clear(&self, group_id: GroupId) -> Result<()> {
        self.rows.write().unwrap().remove(&group_id);
        Ok(())
    }
}

/// In-memory message-text store
#[derive(Default)]
pub struct MockMessageStore {
    texts: RwLock<HashMap<GroupId, Vec<String>>>,
}

impl MockMessageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of texts recorded for a group
    pub fn len(&self, group_id: GroupId) -> usize {
        self.texts
            .read()
            .unwrap()
            .get(&group_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Returns true when nothing is recorded for the group
    pub fn is_empty(&self, group_id: GroupId) -> bool {
        self.len(group_id) == 0
    }
}

#[async_trait]
impl MessageStore for MockMessageStore {
    async fn record_text(&self, group_id: GroupId, text: &str) -> Result<()> {
        self.texts
            .write()
            .unwrap()
            .entry(group_id)
            .or_default()
            .push(text.to_string());
        Ok(())
    }

    async fn texts(&self, group_id: GroupId) -> Result<Vec<String>> {
        Ok(self
            .texts
            .read()
            .unwrap()
            .get(&group_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn clear(&self, group_id: GroupId) -> Result<()> {
        self.texts.write().unwrap().remove(&group_id);
        Ok(())
    }
}

/// Mock renderer returning fixed PNG bytes
pub struct MockCloudRenderer {
    png: Vec<u8>,
    fail_renders: AtomicBool,
    calls: AtomicU64,
    last_texts: RwLock<Vec<String>>,
}

impl Default for MockCloudRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCloudRenderer {
    /// Create a renderer returning placeholder PNG bytes
    pub fn new() -> Self {
        Self {
            png: b"PNG".to_vec(),
            fail_renders: AtomicBool::new(false),
            calls: AtomicU64::new(0),
            last_texts: RwLock::new(Vec::new()),
        }
    }

    /// Make subsequent renders fail (or succeed again)
    pub fn set_fail_renders(&self, fail: bool) {
        self.fail_renders.store(fail, Ordering::SeqCst);
    }

    /// Number of render calls observed (including failed ones)
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// The texts passed to the most recent render call
    pub fn last_texts(&self) -> Vec<String> {
        self.last_texts.read().unwrap().clone()
    }
}

#[async_trait]
impl CloudRenderer for MockCloudRenderer {
    async fn render(&self, texts: &[String]) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_texts.write().unwrap() = texts.to_vec();
        if self.fail_renders.load(Ordering::SeqCst) {
            return Err(Error::Render("mock render failure".to_string()));
        }
        Ok(self.png.clone())
    }
}
