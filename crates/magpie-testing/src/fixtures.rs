//! Shared fixtures for tests

use magpie_core::event::{Event, GroupMessage, Heartbeat};
use magpie_core::Segment;
use magpie_ports::Member;

/// A heartbeat event with the given declared interval
pub fn heartbeat(interval_ms: i64) -> Event {
    Event::Heartbeat(sample_heartbeat(interval_ms))
}

/// A heartbeat with the given declared interval
pub fn sample_heartbeat(interval_ms: i64) -> Heartbeat {
    Heartbeat::new(interval_ms).expect("fixture interval must be positive")
}

/// A plain-text group message event
pub fn group_text(group_id: i64, user_id: i64, text: &str) -> Event {
    Event::group_text(group_id, user_id, next_message_id(), text)
}

/// A plain-text group message
pub fn sample_message(group_id: i64, user_id: i64, text: &str) -> GroupMessage {
    GroupMessage::new(
        group_id,
        user_id,
        next_message_id(),
        vec![Segment::text(text)],
    )
}

/// A member with a nickname and no group card
pub fn member(user_id: i64, nickname: &str) -> Member {
    Member::new(user_id, nickname)
}

fn next_message_id() -> i64 {
    use std::sync::atomic::{AtomicI64, Ordering};
    static NEXT: AtomicI64 = AtomicI64::new(1);
    NEXT.fetch_add(1, Ordering::SeqCst)
}
