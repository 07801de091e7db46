//! Outbound messaging and roster ports

use async_trait::async_trait;
use magpie_core::error::Result;
use magpie_core::{GroupId, MessageId, UserId};

/// A group member as the platform reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Platform user id
    pub user_id: UserId,
    /// Account-level nickname
    pub nickname: String,
    /// Group-local display name; the platform reports an empty string when unset
    pub card: Option<String>,
}

impl Member {
    /// Create a member with no group-local card
    pub fn new(user_id: impl Into<UserId>, nickname: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            nickname: nickname.into(),
            card: None,
        }
    }

    /// Set the group-local card name
    pub fn with_card(mut self, card: impl Into<String>) -> Self {
        self.card = Some(card.into());
        self
    }

    /// Name to show in reports: the group card when set and non-empty,
    /// otherwise the nickname.
    pub fn display_name(&self) -> &str {
        match self.card.as_deref() {
            Some(card) if !card.is_empty() => card,
            _ => &self.nickname,
        }
    }
}

/// Sends messages into groups on behalf of the bot
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send plain text to a group. One attempt; the caller decides about
    /// fallbacks.
    async fn send_group_text(&self, group_id: GroupId, text: &str) -> Result<MessageId>;

    /// Send a PNG image to a group.
    async fn send_group_image(&self, group_id: GroupId, png: &[u8]) -> Result<MessageId>;
}

/// Group membership lookup
#[async_trait]
pub trait MemberRoster: Send + Sync {
    /// Full member list of a group
    async fn group_members(&self, group_id: GroupId) -> Result<Vec<Member>>;
}
