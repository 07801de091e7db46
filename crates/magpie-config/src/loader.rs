//! Configuration file loading and validation
//!
//! Provides functions to load configuration from TOML files:
//!
//! - [`load_config`] - Strict loader, errors if file missing (no side effects)
//! - [`ensure_default_config`] - Creates default config file without loading
//!
//! # Usage
//!
//! ```rust,ignore
//! use magpie_config::{load_config, ensure_default_config};
//! use std::path::Path;
//!
//! // Strict loading (for startup and hot-reload)
//! let config = load_config(Path::new("magpie.toml"))?;
//!
//! // Just create the file without loading
//! let path = ensure_default_config(Path::new("~/magpie/magpie.toml"))?;
//! ```

use crate::paths::{default_config_path, ensure_parent_dir, magpie_home, DEFAULT_CONFIG_FILENAME};
use crate::Config;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration template, written by [`ensure_default_config`].
///
/// Both handlers start disabled; enabling one requires filling in its group
/// list (and, for the word cloud, the render endpoint).
pub const DEFAULT_CONFIG: &str = r#"# Magpie configuration
# Handlers are disabled until you enable them and list their groups.

[connection]
# Send platform requests over the HTTP API instead of the realtime channel.
http_api = false
# Extra margin beyond the declared heartbeat interval before the connection
# is considered stalled (milliseconds).
heartbeat_grace_ms = 0

[handlers.rank]
enabled = false
groups = []
command = "/rank"
daily_cron = "0 0 0 * * *"
rate_limit = 1
rate_period_ms = 60000
top_n = 10

[handlers.word_cloud]
enabled = false
groups = []
command = "/wordcloud"
daily_cron = "0 0 0 * * *"
rate_limit = 1
rate_period_ms = 60000
render_endpoint = ""
filter_patterns = ["^/", "https?://\\S+"]
"#;

/// Errors that can occur during config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}. Create one with ensure_default_config().")]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Resolve config path to the actual file location.
///
/// Resolution order:
/// 1. If the path exists, use it as-is
/// 2. If the path is the bare default filename, check ~/magpie/magpie.toml
/// 3. Otherwise, return the path unchanged (it will be created there or error)
pub fn resolve_config_path(path: &Path) -> PathBuf {
    if path.exists() {
        debug!(path = %path.display(), "Config path exists, using as-is");
        return path.to_path_buf();
    }

    if path == Path::new(DEFAULT_CONFIG_FILENAME) {
        let home_config = default_config_path();
        debug!(path = %home_config.display(), "Using magpie home config path");
        return home_config;
    }

    debug!(path = %path.display(), "Using provided path as-is");
    path.to_path_buf()
}

/// Load configuration from a TOML file (strict - no side effects)
///
/// This is the loader for startup and hot-reload. It:
/// - Does NOT create files if missing (returns `ConfigError::NotFound`)
/// - Only reads, parses, and validates the config file
///
/// Use [`ensure_default_config`] to create a default config.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let resolved_path = resolve_config_path(path);

    if !resolved_path.exists() {
        return Err(ConfigError::NotFound(resolved_path));
    }

    debug!(path = %resolved_path.display(), "Loading config file");
    let content = std::fs::read_to_string(&resolved_path)?;
    load_config_from_str(&content)
}

/// Load configuration from a TOML string
///
/// Parses and validates; every section's validation errors are collected
/// into a single `ConfigError::Validation`.
pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    let errors = config.validate();
    if errors.is_empty() {
        Ok(config)
    } else {
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

/// Create a default configuration file at the specified path
///
/// Does nothing if the file already exists. Returns the path to the config
/// file (existing or newly created).
pub fn ensure_default_config(path: &Path) -> Result<PathBuf, std::io::Error> {
    if path.exists() {
        debug!(path = %path.display(), "Config file already exists");
        return Ok(path.to_path_buf());
    }

    let home = magpie_home();
    if !home.exists() {
        debug!(path = %home.display(), "Creating magpie home directory");
        std::fs::create_dir_all(&home)?;
    }

    ensure_parent_dir(path)?;

    debug!(path = %path.display(), "Writing default config file");
    std::fs::write(path, DEFAULT_CONFIG)?;

    Ok(path.to_path_buf())
}
