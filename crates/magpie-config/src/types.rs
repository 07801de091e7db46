//! Configuration types for Magpie
//!
//! # Module Organization
//!
//! Configuration is split into logical modules:
//! - `connection` - Realtime session settings (HTTP-API mode, heartbeat grace)
//! - `handlers` - Per-handler tables (rank, word cloud)

use crate::connection::ConnectionConfig;
use crate::handlers::{RankConfig, WordCloudConfig};
use serde::{Deserialize, Serialize};

// ============================================================================
// Main Config
// ============================================================================

/// Main Magpie configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub handlers: HandlersConfig,
}

/// Handler tables, one per built-in handler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlersConfig {
    #[serde(default)]
    pub rank: RankConfig,
    #[serde(default)]
    pub word_cloud: WordCloudConfig,
}

impl Config {
    /// Validate the whole configuration
    ///
    /// Returns a list of validation errors (empty if valid). Collects errors
    /// from every section rather than stopping at the first one.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.handlers.rank.validate());
        errors.extend(self.handlers.word_cloud.validate());
        errors
    }
}
