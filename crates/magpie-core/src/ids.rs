//! Identifier newtypes for groups, users, and messages
//!
//! The platform addresses everything by numeric id. Newtypes keep group and
//! user ids from being swapped at call sites and give rate-limit keys a
//! stable string form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a chat group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub i64);

impl GroupId {
    /// Create a new GroupId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw numeric value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for GroupId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Unique identifier for a platform user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    /// Create a new UserId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw numeric value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Unique identifier for a delivered message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl MessageId {
    /// Create a new MessageId
    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(GroupId::new(123456).to_string(), "123456");
        assert_eq!(UserId::new(42).to_string(), "42");
        assert_eq!(MessageId::new(-1).to_string(), "-1");
    }

    #[test]
    fn test_id_from_i64() {
        assert_eq!(GroupId::from(7), GroupId::new(7));
        assert_eq!(UserId::from(7), UserId::new(7));
    }

    #[test]
    fn test_ids_are_distinct_types() {
        // Compile-time property; the assertion just keeps the test body non-empty.
        let group = GroupId::new(1);
        let user = UserId::new(1);
        assert_eq!(group.value(), user.value());
    }

    #[test]
    fn test_id_serde() {
        let group: GroupId = serde_json::from_str("123").unwrap();
        assert_eq!(group, GroupId::new(123));
        assert_eq!(serde_json::to_string(&group).unwrap(), "123");
    }
}
