//! Per-handler configuration tables
//!
//! Each handler gets its own `[handlers.*]` table with an `enabled` switch,
//! a group allow-list, its trigger command, the cron spec for its daily job,
//! and its rate-limit window.

use crate::constants::{
    DEFAULT_CLOUD_COMMAND, DEFAULT_CLOUD_FILTERS, DEFAULT_DAILY_CRON, DEFAULT_RANK_COMMAND,
    DEFAULT_RANK_TOP_N, DEFAULT_RATE_LIMIT, DEFAULT_RATE_PERIOD_MS,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Rank Handler Config
// ============================================================================

/// Configuration for the group activity ranking handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankConfig {
    /// Enable the handler (default: false)
    #[serde(default)]
    pub enabled: bool,
    /// Group ids the handler serves; empty means no groups
    #[serde(default)]
    pub groups: Vec<i64>,
    /// Trigger command for an on-demand ranking (default: "/rank")
    #[serde(default = "default_rank_command")]
    pub command: String,
    /// Cron spec for the end-of-day ranking job (default: midnight)
    #[serde(default = "default_daily_cron")]
    pub daily_cron: String,
    /// Admissions allowed per rate-limit period (default: 1)
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
    /// Rate-limit period per group in milliseconds (default: 60000)
    #[serde(default = "default_rate_period_ms")]
    pub rate_period_ms: u64,
    /// Number of entries shown in a ranking report (default: 10)
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_rank_command() -> String {
    DEFAULT_RANK_COMMAND.to_string()
}

fn default_daily_cron() -> String {
    DEFAULT_DAILY_CRON.to_string()
}

fn default_rate_limit() -> u32 {
    DEFAULT_RATE_LIMIT
}

fn default_rate_period_ms() -> u64 {
    DEFAULT_RATE_PERIOD_MS
}

fn default_top_n() -> usize {
    DEFAULT_RANK_TOP_N
}

impl Default for RankConfig {
    fn default() -> Self {
        RankConfig {
            enabled: false,
            groups: Vec::new(),
            command: default_rank_command(),
            daily_cron: default_daily_cron(),
            rate_limit: default_rate_limit(),
            rate_period_ms: default_rate_period_ms(),
            top_n: default_top_n(),
        }
    }
}

impl RankConfig {
    /// Validate the rank handler configuration
    ///
    /// Returns a list of validation errors (empty if valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.command.trim().is_empty() {
            errors.push("handlers.rank.command must not be empty".to_string());
        }
        if self.daily_cron.trim().is_empty() {
            errors.push("handlers.rank.daily_cron must not be empty".to_string());
        }
        if self.rate_period_ms == 0 {
            errors.push("handlers.rank.rate_period_ms must be greater than 0".to_string());
        }
        if self.top_n == 0 {
            errors.push("handlers.rank.top_n must be greater than 0".to_string());
        }
        if self.enabled && self.groups.is_empty() {
            errors.push(
                "handlers.rank is enabled but handlers.rank.groups is empty".to_string(),
            );
        }

        errors
    }
}

// ============================================================================
// Word Cloud Handler Config
// ============================================================================

/// Configuration for the daily word-cloud handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCloudConfig {
    /// Enable the handler (default: false)
    #[serde(default)]
    pub enabled: bool,
    /// Group ids the handler serves; empty means no groups
    #[serde(default)]
    pub groups: Vec<i64>,
    /// Trigger command for an on-demand cloud (default: "/wordcloud")
    #[serde(default = "default_cloud_command")]
    pub command: String,
    /// Cron spec for the end-of-day cloud job (default: midnight)
    #[serde(default = "default_daily_cron")]
    pub daily_cron: String,
    /// Admissions allowed per rate-limit period (default: 1)
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
    /// Rate-limit period per group in milliseconds (default: 60000)
    #[serde(default = "default_rate_period_ms")]
    pub rate_period_ms: u64,
    /// Rendering service endpoint; must be set when the handler is enabled
    #[serde(default)]
    pub render_endpoint: String,
    /// Texts matching any of these regexes are not collected (default:
    /// commands and bare links)
    #[serde(default = "default_filter_patterns")]
    pub filter_patterns: Vec<String>,
    /// Directory for text snapshots when rendering or sending fails
    /// (default: ~/magpie/backup/)
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
}

fn default_cloud_command() -> String {
    DEFAULT_CLOUD_COMMAND.to_string()
}

fn default_filter_patterns() -> Vec<String> {
    DEFAULT_CLOUD_FILTERS.iter().map(|p| p.to_string()).collect()
}

fn default_backup_dir() -> PathBuf {
    crate::paths::default_backup_dir()
}

impl Default for WordCloudConfig {
    fn default() -> Self {
        WordCloudConfig {
            enabled: false,
            groups: Vec::new(),
            command: default_cloud_command(),
            daily_cron: default_daily_cron(),
            rate_limit: default_rate_limit(),
            rate_period_ms: default_rate_period_ms(),
            render_endpoint: String::new(),
            filter_patterns: default_filter_patterns(),
            backup_dir: default_backup_dir(),
        }
    }
}

impl WordCloudConfig {
    /// Validate the word-cloud handler configuration
    ///
    /// Returns a list of validation errors (empty if valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.command.trim().is_empty() {
            errors.push("handlers.word_cloud.command must not be empty".to_string());
        }
        if self.daily_cron.trim().is_empty() {
            errors.push("handlers.word_cloud.daily_cron must not be empty".to_string());
        }
        if self.rate_period_ms == 0 {
            errors.push("handlers.word_cloud.rate_period_ms must be greater than 0".to_string());
        }
        if self.enabled && self.render_endpoint.trim().is_empty() {
            errors.push(
                "handlers.word_cloud is enabled but handlers.word_cloud.render_endpoint is empty"
                    .to_string(),
            );
        }
        if self.enabled && self.groups.is_empty() {
            errors.push(
                "handlers.word_cloud is enabled but handlers.word_cloud.groups is empty"
                    .to_string(),
            );
        }
        for pattern in &self.filter_patterns {
            if let Err(e) = regex::Regex::new(pattern) {
                errors.push(format!(
                    "handlers.word_cloud.filter_patterns entry {:?} is not a valid regex: {}",
                    pattern, e
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_config_default_valid() {
        let config = RankConfig::default();
        let errors = config.validate();
        assert!(
            errors.is_empty(),
            "Default config should be valid: {:?}",
            errors
        );
        assert_eq!(config.command, "/rank");
        assert_eq!(config.rate_limit, 1);
        assert_eq!(config.rate_period_ms, 60_000);
        assert_eq!(config.top_n, 10);
    }

    #[test]
    fn test_rank_config_rejects_zero_period() {
        let config = RankConfig {
            rate_period_ms: 0,
            ..Default::default()
        };
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("rate_period_ms")));
    }

    #[test]
    fn test_rank_config_enabled_needs_groups() {
        let config = RankConfig {
            enabled: true,
            ..Default::default()
        };
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("groups")));

        let config = RankConfig {
            enabled: true,
            groups: vec![1001],
            ..Default::default()
        };
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_word_cloud_config_default_valid() {
        let config = WordCloudConfig::default();
        let errors = config.validate();
        assert!(
            errors.is_empty(),
            "Default config should be valid: {:?}",
            errors
        );
        assert_eq!(config.command, "/wordcloud");
        assert_eq!(config.filter_patterns.len(), 2);
    }

    #[test]
    fn test_word_cloud_config_enabled_needs_endpoint() {
        let config = WordCloudConfig {
            enabled: true,
            groups: vec![1001],
            ..Default::default()
        };
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("render_endpoint")));
    }

    #[test]
    fn test_word_cloud_config_rejects_bad_regex() {
        let config = WordCloudConfig {
            filter_patterns: vec!["[unclosed".to_string()],
            ..Default::default()
        };
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("not a valid regex")));
    }

    #[test]
    fn test_word_cloud_default_filters_compile() {
        for pattern in WordCloudConfig::default().filter_patterns {
            assert!(regex::Regex::new(&pattern).is_ok(), "pattern {:?}", pattern);
        }
    }
}
