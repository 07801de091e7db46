//! Path utilities for Magpie configuration
//!
//! Provides home directory expansion and path resolution utilities.
//! Works cross-platform (Unix: ~/magpie, Windows: %USERPROFILE%\magpie).

use std::path::{Path, PathBuf};

use crate::constants::ENV_MAGPIE_CONFIG;

/// Default magpie data directory name
pub const MAGPIE_DIR_NAME: &str = "magpie";

/// Default log subdirectory name
pub const LOG_DIR_NAME: &str = "log";

/// Default backup subdirectory name (word-cloud text snapshots)
pub const BACKUP_DIR_NAME: &str = "backup";

/// Default bot log filename (for tracing logs with daily rotation)
pub const DEFAULT_BOT_LOG_FILENAME: &str = "magpie.log";

/// Default config filename
pub const DEFAULT_CONFIG_FILENAME: &str = "magpie.toml";

/// Get user's magpie home directory.
///
/// Returns `~/magpie` on Unix or `%USERPROFILE%\magpie` on Windows.
/// Falls back to current directory if home cannot be determined.
///
/// # Example
/// ```
/// use magpie_config::paths::magpie_home;
/// let home = magpie_home();
/// // On Unix: /home/user/magpie
/// // On Windows: C:\Users\user\magpie
/// ```
pub fn magpie_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(MAGPIE_DIR_NAME)
}

/// Get default log directory.
///
/// Returns `~/magpie/log/`.
pub fn default_log_dir() -> PathBuf {
    magpie_home().join(LOG_DIR_NAME)
}

/// Get default bot log file path (for tracing logs with daily rotation).
///
/// Returns `~/magpie/log/magpie.log`.
pub fn default_bot_log_path() -> PathBuf {
    default_log_dir().join(DEFAULT_BOT_LOG_FILENAME)
}

/// Get default backup directory for word-cloud text snapshots.
///
/// Returns `~/magpie/backup/`.
pub fn default_backup_dir() -> PathBuf {
    magpie_home().join(BACKUP_DIR_NAME)
}

/// Get default configuration file path.
///
/// Returns `~/magpie/magpie.toml`.
pub fn default_config_path() -> PathBuf {
    magpie_home().join(DEFAULT_CONFIG_FILENAME)
}

/// Discover configuration file path from multiple sources.
///
/// Resolution order:
/// 1. `--config <path>` or `-c <path>` CLI argument
/// 2. `MAGPIE_CONFIG` environment variable (if set and non-empty)
/// 3. Default config path (`~/magpie/magpie.toml`)
///
/// Returns a tuple of (path, source) where source describes where the path came from.
///
/// # Example
/// ```
/// use magpie_config::paths::discover_config_path;
///
/// let (path, source) = discover_config_path();
/// println!("Using config from {}: {}", source, path.display());
/// ```
pub fn discover_config_path() -> (PathBuf, &'static str) {
    // Check CLI arguments for --config or -c
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            let path = expand_tilde(Path::new(&args[i + 1]));
            return (path, "--config CLI arg");
        }
        // Also handle --config=path format
        if let Some(path_str) = args[i].strip_prefix("--config=") {
            let path = expand_tilde(Path::new(path_str));
            return (path, "--config CLI arg");
        }
        if let Some(path_str) = args[i].strip_prefix("-c=") {
            let path = expand_tilde(Path::new(path_str));
            return (path, "-c CLI arg");
        }
    }

    // Check MAGPIE_CONFIG environment variable
    if let Ok(config_path) = std::env::var(ENV_MAGPIE_CONFIG) {
        if !config_path.is_empty() {
            let path = expand_tilde(Path::new(&config_path));
            return (path, "MAGPIE_CONFIG env var");
        }
    }

    // Fall back to default config path
    (default_config_path(), "default location")
}

/// Expand tilde (~) in path to user's home directory.
///
/// - `~/foo` becomes `/home/user/foo` on Unix
/// - `~/foo` becomes `C:\Users\user\foo` on Windows
/// - Paths without tilde are returned unchanged
///
/// # Example
/// ```
/// use magpie_config::paths::expand_tilde;
/// use std::path::Path;
///
/// let expanded = expand_tilde(Path::new("~/magpie/magpie.toml"));
/// // Returns /home/user/magpie/magpie.toml on Unix
/// ```
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(stripped)
    } else {
        path.to_path_buf()
    }
}

/// Ensure parent directory of a path exists.
///
/// Creates the parent directory and all intermediate directories if they don't exist.
/// Does nothing if the path has no parent or parent already exists.
///
/// # Errors
/// Returns an error if directory creation fails (e.g., permission denied).
pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Resolve a path relative to a base directory.
///
/// - Absolute paths are returned unchanged
/// - Paths starting with `~` are expanded to home directory
/// - Relative paths are joined with the base directory
///
/// # Example
/// ```
/// use magpie_config::paths::resolve_path;
/// use std::path::Path;
///
/// let base = Path::new("/etc/magpie");
///
/// // Absolute path unchanged
/// assert_eq!(resolve_path(base, Path::new("/var/cloud.txt")), Path::new("/var/cloud.txt"));
///
/// // Relative path joined with base
/// assert_eq!(resolve_path(base, Path::new("cloud.txt")), Path::new("/etc/magpie/cloud.txt"));
/// ```
pub fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    // First expand tilde if present
    let expanded = expand_tilde(path);

    if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magpie_home_not_empty() {
        let home = magpie_home();
        assert!(!home.as_os_str().is_empty());
        assert!(home.ends_with(MAGPIE_DIR_NAME));
    }

    #[test]
    fn test_default_log_dir() {
        let log_dir = default_log_dir();
        assert!(log_dir.ends_with(LOG_DIR_NAME));
        assert!(log_dir.to_string_lossy().contains(MAGPIE_DIR_NAME));
    }

    #[test]
    fn test_default_bot_log_path() {
        let log_path = default_bot_log_path();
        assert!(log_path.ends_with(DEFAULT_BOT_LOG_FILENAME));
        assert!(log_path.to_string_lossy().contains(LOG_DIR_NAME));
    }

    #[test]
    fn test_default_backup_dir() {
        let backup_dir = default_backup_dir();
        assert!(backup_dir.ends_with(BACKUP_DIR_NAME));
        assert!(backup_dir.to_string_lossy().contains(MAGPIE_DIR_NAME));
    }

    #[test]
    fn test_default_config_path() {
        let config_path = default_config_path();
        assert!(config_path.ends_with(DEFAULT_CONFIG_FILENAME));
        assert!(config_path.to_string_lossy().contains(MAGPIE_DIR_NAME));
    }

    #[test]
    fn test_expand_tilde() {
        // Path without tilde should be unchanged
        let no_tilde = Path::new("/absolute/path");
        assert_eq!(expand_tilde(no_tilde), no_tilde);

        // Relative path without tilde should be unchanged
        let relative = Path::new("relative/path");
        assert_eq!(expand_tilde(relative), relative);

        // Path with tilde should expand
        let with_tilde = Path::new("~/foo/bar");
        let expanded = expand_tilde(with_tilde);
        assert!(expanded.is_absolute() || expanded.starts_with(".")); // fallback case
        assert!(expanded.ends_with("foo/bar") || expanded.ends_with("foo\\bar"));
    }

    #[test]
    fn test_resolve_path_absolute() {
        let base = Path::new("/base/dir");
        let absolute = Path::new("/absolute/path");
        assert_eq!(resolve_path(base, absolute), absolute);
    }

    #[test]
    fn test_resolve_path_relative() {
        let base = Path::new("/base/dir");
        let relative = Path::new("relative/path");
        assert_eq!(
            resolve_path(base, relative),
            PathBuf::from("/base/dir/relative/path")
        );
    }

    #[test]
    fn test_ensure_parent_dir_creates_directory() {
        let temp_dir = std::env::temp_dir();
        let test_dir = temp_dir.join("magpie_test_ensure_parent");
        let nested_path = test_dir.join("a/b/c/file.txt");

        // Clean up if exists from previous run
        let _ = std::fs::remove_dir_all(&test_dir);

        // Should create parent directories
        ensure_parent_dir(&nested_path).unwrap();
        assert!(nested_path.parent().unwrap().exists());

        // Cleanup
        let _ = std::fs::remove_dir_all(&test_dir);
    }
}
