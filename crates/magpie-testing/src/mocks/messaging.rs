//! Mock sender and roster

use async_trait::async_trait;
use magpie_core::error::{Error, Result};
use magpie_core::{GroupId, MessageId};
use magpie_ports::{Member, MemberRoster, MessageSender};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::RwLock;

/// A mock message sender that records everything it is asked to send
#[derive(Default)]
pub struct MockMessageSender {
    texts: RwLock<Vec<(GroupId, String)>>,
    images: RwLock<Vec<(GroupId, Vec<u8>)>>,
    fail_sends: AtomicBool,
    next_id: AtomicI64,
}

impl MockMessageSender {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again)
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// All recorded text sends, in order
    pub fn texts(&self) -> Vec<(GroupId, String)> {
        self.texts.read().unwrap().clone()
    }

    /// All recorded image sends, in order
    pub fn images(&self) -> Vec<(GroupId, Vec<u8>)> {
        self.images.read().unwrap().clone()
    }

    /// The most recent text send, if any
    pub fn last_text(&self) -> Option<(GroupId, String)> {
        self.texts.read().unwrap().last().cloned()
    }

    fn next_message_id(&self) -> MessageId {
        MessageId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl MessageSender for MockMessageSender {
    async fn send_group_text(&self, group_id: GroupId, text: &str) -> Result<MessageId> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::send_failed(group_id.value(), "mock send failure"));
        }
        self.texts
            .write()
            .unwrap()
            .push((group_id, text.to_string()));
        Ok(self.next_message_id())
    }

    async fn send_group_image(&self, group_id: GroupId, png: &[u8]) -> Result<MessageId> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Error::send_failed(group_id.value(), "mock send failure"));
        }
        self.images.write().unwrap().push((group_id, png.to_vec()));
        Ok(self.next_message_id())
    }
}

/// A mock roster with per-group member lists set by the test
#[derive(Default)]
pub struct MockMemberRoster {
    members: RwLock<HashMap<GroupId, Vec<Member>>>,
    fail_lookups: AtomicBool,
}

impl MockMemberRoster {
    /// Create an empty roster
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the member list for a group
    pub fn set_members(&self, group_id: GroupId, members: Vec<Member>) {
        self.members.write().unwrap().insert(group_id, members);
    }

    /// Make subsequent lookups fail (or succeed again)
    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MemberRoster for MockMemberRoster {
    async fn group_members(&self, group_id: GroupId) -> Result<Vec<Member>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::roster_lookup(group_id.value(), "mock lookup failure"));
        }
        Ok(self
            .members
            .read()
            .unwrap()
            .get(&group_id)
            .cloned()
            .unwrap_or_default())
    }
}
