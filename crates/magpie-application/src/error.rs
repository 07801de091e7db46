//! Application layer error types
//!
//! Wraps domain errors and adds the failures that only exist at this layer
//! (backup-file writes, configuration changes that cannot be hot-applied).
//!
//! ## Error Handling Philosophy
//!
//! Errors are propagated to the invocation that caused them: a failing queued
//! action fails its own caller and nothing else, the dispatcher logs handler
//! failures without stopping the dispatch loop, and the watchdog logs
//! resubscription failures because nothing awaits its internal cycle. A
//! rate-limit rejection is control flow, not an error, and never appears here.

use std::path::PathBuf;
use thiserror::Error;

/// Application layer error
#[derive(Debug, Error)]
pub enum Error {
    /// Domain layer error
    #[error(transparent)]
    Core(#[from] magpie_core::Error),

    /// Writing a text snapshot after a failed send/render
    #[error("Backup write failed for {path}: {message}")]
    Backup { path: PathBuf, message: String },

    /// Configuration section that cannot be changed without a restart
    #[error("Config field '{0}' requires a process restart")]
    RestartRequired(String),

    /// Invalid configuration value caught at apply time
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfig { field: String, message: String },
}

impl Error {
    /// Helper to create a backup-write failure
    pub fn backup(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Backup {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Helper to create an invalid-config failure
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
