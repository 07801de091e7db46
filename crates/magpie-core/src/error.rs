//! Error types for the Magpie core domain

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Event errors
    #[error("Failed to decode event payload: {0}")]
    EventDecode(String),

    #[error("Heartbeat declared a non-positive interval: {0}ms")]
    InvalidHeartbeatInterval(i64),

    // Boundary errors (messaging, roster, storage, rendering, scheduling)
    #[error("Message send failed for group {group_id}: {message}")]
    SendFailed { group_id: i64, message: String },

    #[error("Roster lookup failed for group {group_id}: {message}")]
    RosterLookup { group_id: i64, message: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Failed to schedule job '{spec}': {message}")]
    Schedule { spec: String, message: String },

    // Connection session errors
    #[error("Event stream resubscription failed: {0}")]
    ResubscribeEvents(String),

    #[error("Request channel resubscription failed: {0}")]
    ResubscribeApi(String),

    // Execution errors
    #[error("Queued task aborted before completion: {0}")]
    TaskAborted(String),

    #[error("Queue closed while task was pending")]
    QueueClosed,

    // Infrastructure errors
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Helper to create a send failure for a group
    pub fn send_failed(group_id: i64, message: impl Into<String>) -> Self {
        Error::SendFailed {
            group_id,
            message: message.into(),
        }
    }

    /// Helper to create a roster lookup failure for a group
    pub fn roster_lookup(group_id: i64, message: impl Into<String>) -> Self {
        Error::RosterLookup {
            group_id,
            message: message.into(),
        }
    }

    /// Helper to create a schedule failure
    pub fn schedule(spec: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Schedule {
            spec: spec.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error came from a resubscription attempt.
    ///
    /// The watchdog logs these instead of propagating them; nothing awaits
    /// its internal cycle.
    pub fn is_resubscribe(&self) -> bool {
        matches!(self, Error::ResubscribeEvents(_) | Error::ResubscribeApi(_))
    }
}

// Error conversions
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::EventDecode(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::send_failed(42, "socket closed");
        assert_eq!(
            err.to_string(),
            "Message send failed for group 42: socket closed"
        );

        let err = Error::InvalidHeartbeatInterval(-5);
        assert!(err.to_string().contains("-5ms"));
    }

    #[test]
    fn test_is_resubscribe() {
        assert!(Error::ResubscribeEvents("ws closed".to_string()).is_resubscribe());
        assert!(Error::ResubscribeApi("ws closed".to_string()).is_resubscribe());
        assert!(!Error::QueueClosed.is_resubscribe());
        assert!(!Error::Store("busy".to_string()).is_resubscribe());
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::EventDecode(_)));
    }

    #[test]
    fn test_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
