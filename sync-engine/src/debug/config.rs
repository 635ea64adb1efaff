//! Logging configuration from environment variables

use std::path::PathBuf;

use lib_utils::{get_env_bool, get_env_or};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory for rotated log files
    pub log_dir: PathBuf,
    /// File name prefix inside `log_dir`
    pub file_prefix: String,
    /// Log level filter (e.g., "sync_engine=debug,info")
    pub log_level: String,
    /// Mirror events to stderr
    pub stderr: bool,
    /// Emit JSON lines instead of the human-readable format
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            file_prefix: "sync-engine.log".to_string(),
            log_level: "sync_engine=info,warn".to_string(),
            stderr: false,
            json: false,
        }
    }
}

impl LogConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_dir: PathBuf::from(get_env_or("SYNC_LOG_DIR", "logs")),
            file_prefix: defaults.file_prefix,
            log_level: get_env_or("RUST_LOG", &defaults.log_level),
            stderr: get_env_bool("SYNC_LOG_STDERR", false),
            json: get_env_bool("SYNC_LOG_JSON", false),
        }
    }

    /// Check if debug logging is enabled
    pub fn is_debug_enabled(&self) -> bool {
        self.log_level.contains("debug") || self.log_level.contains("trace")
    }
}
