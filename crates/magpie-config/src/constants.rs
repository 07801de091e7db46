//! Default values for all configuration fields
//!
//! Centralized so the TOML template, the `Default` impls, and the docs
//! cannot drift apart.

/// Environment variable overriding the config file location
pub const ENV_MAGPIE_CONFIG: &str = "MAGPIE_CONFIG";

/// Default watchdog grace margin beyond the declared heartbeat interval.
///
/// Zero means a heartbeat is considered missed the instant the declared
/// interval elapses. Raise this on jittery links.
pub const DEFAULT_HEARTBEAT_GRACE_MS: u64 = 0;

/// Default request transport: realtime channel (false) vs HTTP API (true)
pub const DEFAULT_HTTP_API: bool = false;

/// Default cron spec for daily handler jobs (midnight, local time)
pub const DEFAULT_DAILY_CRON: &str = "0 0 0 * * *";

/// Default rate-limit admissions per period
pub const DEFAULT_RATE_LIMIT: u32 = 1;

/// Default rate-limit period in milliseconds
pub const DEFAULT_RATE_PERIOD_MS: u64 = 60_000;

/// Default trigger command for the activity ranking handler
pub const DEFAULT_RANK_COMMAND: &str = "/rank";

/// Default number of entries shown in a ranking report
pub const DEFAULT_RANK_TOP_N: usize = 10;

/// Default trigger command for the word-cloud handler
pub const DEFAULT_CLOUD_COMMAND: &str = "/wordcloud";

/// Default message filters for word-cloud collection.
///
/// Commands and bare links carry no cloud-worthy words.
pub const DEFAULT_CLOUD_FILTERS: &[&str] = &["^/", "https?://\\S+"];
