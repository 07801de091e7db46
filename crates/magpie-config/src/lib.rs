//! Configuration types and loading for Magpie
//!
//! This crate provides:
//! - Configuration structures for the connection session and handlers
//! - Config file loading (TOML format)
//! - Validation of every section before the config is accepted
//!
//! # Architecture
//!
//! Configuration is an **infrastructure concern** and lives outside the domain
//! layer. This crate has no dependency on `magpie-core`; the application layer
//! translates config values into domain terms at construction time.
//!
//! # Module Organization
//!
//! - `connection` - Realtime session settings (HTTP-API mode, heartbeat grace)
//! - `handlers` - Per-handler tables (rank, word cloud)
//! - `constants` - Default values for all fields
//! - `paths` - Home directory and path resolution utilities
//!
//! # Usage
//!
//! ```rust,ignore
//! use magpie_config::{load_config, Config};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("magpie.toml"))?;
//! if config.handlers.rank.enabled {
//!     println!("rank groups: {:?}", config.handlers.rank.groups);
//! }
//! ```

mod loader;

// Default constants for all configuration values
pub mod constants;

// Path utilities
pub mod paths;

// Config modules - organized by domain
mod connection;
mod handlers;

// Core types module that ties the sections together
mod types;

pub use connection::ConnectionConfig;
pub use handlers::{RankConfig, WordCloudConfig};
pub use loader::{
    ensure_default_config, load_config, load_config_from_str, resolve_config_path, ConfigError,
    DEFAULT_CONFIG,
};
pub use types::{Config, HandlersConfig};

// Re-export commonly used constants for convenience
pub use constants::{
    DEFAULT_CLOUD_COMMAND, DEFAULT_DAILY_CRON, DEFAULT_HEARTBEAT_GRACE_MS, DEFAULT_RANK_COMMAND,
    DEFAULT_RATE_LIMIT, DEFAULT_RATE_PERIOD_MS,
};
