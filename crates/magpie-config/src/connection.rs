//! Connection configuration for the realtime platform session

use crate::constants::{DEFAULT_HEARTBEAT_GRACE_MS, DEFAULT_HTTP_API};
use serde::{Deserialize, Serialize};

/// Connection configuration
///
/// Changing any field of this section requires a process restart; the
/// hot-reload path rejects edits here (see `magpie_application::AppContext`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Send platform requests over the HTTP API instead of the realtime
    /// channel (default: false)
    ///
    /// When enabled, a stalled realtime channel does not invalidate API
    /// calls, so the watchdog skips the API resubscription on recovery.
    #[serde(default = "default_http_api")]
    pub http_api: bool,
    /// Extra margin beyond the declared heartbeat interval before the
    /// connection is considered stalled, in milliseconds (default: 0)
    #[serde(default = "default_heartbeat_grace_ms")]
    pub heartbeat_grace_ms: u64,
}

fn default_http_api() -> bool {
    DEFAULT_HTTP_API
}

fn default_heartbeat_grace_ms() -> u64 {
    DEFAULT_HEARTBEAT_GRACE_MS
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            http_api: default_http_api(),
            heartbeat_grace_ms: default_heartbeat_grace_ms(),
        }
    }
}
