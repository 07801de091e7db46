//! Inbound events decoded from the platform connection
//!
//! Two event classes matter to this pipeline: heartbeats (connection
//! liveness, carrying the server-declared interval) and group messages.
//! Everything else the platform emits is dropped at the session boundary
//! before it reaches dispatch.

use crate::ids::{GroupId, MessageId, UserId};
use crate::message::{plain_text, Segment};
use crate::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Connection liveness signal with the server-declared delivery interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    /// Declared interval until the next heartbeat, in milliseconds
    pub interval_ms: i64,

    /// Event timestamp (microseconds since epoch)
    pub timestamp: i64,
}

impl Heartbeat {
    /// Create a heartbeat with the current timestamp.
    ///
    /// The declared interval drives the watchdog deadline, so a
    /// non-positive value is rejected here rather than downstream.
    pub fn new(interval_ms: i64) -> Result<Self> {
        if interval_ms <= 0 {
            return Err(Error::InvalidHeartbeatInterval(interval_ms));
        }
        Ok(Self {
            interval_ms,
            timestamp: Utc::now().timestamp_micros(),
        })
    }

    /// Declared interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms as u64)
    }
}

/// A message delivered to a group the bot is a member of
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMessage {
    /// Group the message was posted in
    pub group_id: GroupId,

    /// Author of the message
    pub user_id: UserId,

    /// Platform-assigned message id
    pub message_id: MessageId,

    /// Ordered message content
    pub segments: Vec<Segment>,

    /// Event timestamp (microseconds since epoch)
    pub timestamp: i64,
}

impl GroupMessage {
    /// Create a group message with the current timestamp
    pub fn new(
        group_id: impl Into<GroupId>,
        user_id: impl Into<UserId>,
        message_id: impl Into<MessageId>,
        segments: Vec<Segment>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            user_id: user_id.into(),
            message_id: message_id.into(),
            segments,
            timestamp: Utc::now().timestamp_micros(),
        }
    }

    /// Flattened text content (text segments joined, trimmed)
    pub fn plain_text(&self) -> String {
        plain_text(&self.segments)
    }
}

/// An inbound event from the platform connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// Heartbeat-class event; re-arms the watchdog
    Heartbeat(Heartbeat),
    /// Group message; dispatched to registered handlers
    GroupMessage(GroupMessage),
}

impl Event {
    /// Create a heartbeat event
    pub fn heartbeat(interval_ms: i64) -> Result<Self> {
        Ok(Event::Heartbeat(Heartbeat::new(interval_ms)?))
    }

    /// Create a group message event with plain-text content
    pub fn group_text(
        group_id: impl Into<GroupId>,
        user_id: impl Into<UserId>,
        message_id: impl Into<MessageId>,
        text: impl Into<String>,
    ) -> Self {
        Event::GroupMessage(GroupMessage::new(
            group_id,
            user_id,
            message_id,
            vec![Segment::text(text)],
        ))
    }

    /// Returns true for heartbeat-class events
    pub fn is_heartbeat(&self) -> bool {
        matches!(self, Event::Heartbeat(_))
    }

    /// Declared heartbeat interval, if this is a heartbeat
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        match self {
            Event::Heartbeat(hb) => Some(hb.interval()),
            Event::GroupMessage(_) => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Heartbeat(hb) => write!(f, "heartbeat interval={}ms", hb.interval_ms),
            Event::GroupMessage(msg) => {
                write!(f, "group_message group={} user={}", msg.group_id, msg.user_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_new() {
        let hb = Heartbeat::new(5000).unwrap();
        assert_eq!(hb.interval_ms, 5000);
        assert_eq!(hb.interval(), Duration::from_millis(5000));
        assert!(hb.timestamp > 0);
    }

    #[test]
    fn test_heartbeat_rejects_non_positive_interval() {
        assert!(matches!(
            Heartbeat::new(0),
            Err(Error::InvalidHeartbeatInterval(0))
        ));
        assert!(matches!(
            Heartbeat::new(-100),
            Err(Error::InvalidHeartbeatInterval(-100))
        ));
    }

    #[test]
    fn test_group_message_plain_text() {
        let msg = GroupMessage::new(
            1,
            2,
            3,
            vec![Segment::at(9), Segment::text("/rank")],
        );
        assert_eq!(msg.plain_text(), "/rank");
    }

    #[test]
    fn test_event_is_heartbeat() {
        let hb = Event::heartbeat(3000).unwrap();
        assert!(hb.is_heartbeat());
        assert_eq!(hb.heartbeat_interval(), Some(Duration::from_millis(3000)));

        let msg = Event::group_text(1, 2, 3, "hello");
        assert!(!msg.is_heartbeat());
        assert_eq!(msg.heartbeat_interval(), None);
    }

    #[test]
    fn test_event_serde_roundtrip() {
        let event = Event::group_text(10, 20, 30, "hello world");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"group_message\""));

        let deserialized: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn test_event_display() {
        let hb = Event::heartbeat(5000).unwrap();
        assert_eq!(hb.to_string(), "heartbeat interval=5000ms");

        let msg = Event::group_text(10, 20, 30, "hi");
        assert!(msg.to_string().contains("group=10"));
        assert!(msg.to_string().contains("user=20"));
    }
}
