//! # Engine Configuration
//!
//! Configuration is read from environment variables (after loading a `.env`
//! file if present) and validated once at startup.
//!
//! ```rust,no_run
//! use sync_engine::core::config::{init_config, sync_config};
//!
//! init_config()?;
//! let ttl = sync_config().cache_ttl;
//! # Ok::<(), sync_engine::SyncError>(())
//! ```
//!
//! Components never read the global directly; they take a [`SyncConfig`] at
//! construction so tests can pass their own.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use lib_utils::{get_env_or, get_env_parse_or};

use super::error::{Result, SyncError};

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3001";

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Base URL of the Remote Data Service
    pub api_base_url: String,

    /// Push channel endpoint; the user-scoped channel key is appended
    pub push_url: String,

    /// Directory backing the durable file store
    pub storage_dir: PathBuf,

    /// Staleness TTL shared by every cache instance
    pub cache_ttl: Duration,

    /// Failsafe window after which a pending transaction is failed
    pub tx_failsafe: Duration,

    /// Connection attempts before the push transport gives up
    pub push_max_connect_attempts: u64,

    /// Per-request HTTP timeout
    pub http_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            push_url: push_url_from(DEFAULT_API_BASE_URL),
            storage_dir: PathBuf::from("data/storage"),
            cache_ttl: Duration::from_secs(5 * 60),
            tx_failsafe: Duration::from_secs(120),
            push_max_connect_attempts: 5,
            http_timeout: Duration::from_secs(10),
        }
    }
}

/// `http(s)://host` -> `ws(s)://host/api/ws`
fn push_url_from(api_base_url: &str) -> String {
    api_base_url
        .trim_end_matches('/')
        .replace("https://", "wss://")
        .replace("http://", "ws://")
        + "/api/ws"
}

impl SyncConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is normal outside development
        let _ = dotenvy::dotenv();

        let api_base_url = get_env_or("API_BASE_URL", DEFAULT_API_BASE_URL);
        let push_url = get_env_or("PUSH_URL", &push_url_from(&api_base_url));
        let storage_dir = PathBuf::from(get_env_or("SYNC_STORAGE_DIR", "data/storage"));

        let cache_ttl_secs: u64 = get_env_parse_or("CACHE_TTL_SECS", 300).map_err(config_err)?;
        let tx_failsafe_secs: u64 = get_env_parse_or("TX_FAILSAFE_SECS", 120).map_err(config_err)?;
        let push_max_connect_attempts: u64 =
            get_env_parse_or("PUSH_MAX_CONNECT_ATTEMPTS", 5).map_err(config_err)?;
        let http_timeout_secs: u64 = get_env_parse_or("HTTP_TIMEOUT_SECS", 10).map_err(config_err)?;

        Ok(Self {
            api_base_url,
            push_url,
            storage_dir,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            tx_failsafe: Duration::from_secs(tx_failsafe_secs),
            push_max_connect_attempts,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }

    /// Validate values that would otherwise fail much later and less clearly.
    pub fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(SyncError::Validation(format!(
                "API_BASE_URL must start with http:// or https://, got {}",
                self.api_base_url
            )));
        }

        if !(self.push_url.starts_with("ws://") || self.push_url.starts_with("wss://")) {
            return Err(SyncError::Validation(format!(
                "PUSH_URL must start with ws:// or wss://, got {}",
                self.push_url
            )));
        }

        if self.tx_failsafe.is_zero() {
            return Err(SyncError::Validation("TX_FAILSAFE_SECS must be greater than 0".to_string()));
        }

        if self.push_max_connect_attempts == 0 {
            return Err(SyncError::Validation(
                "PUSH_MAX_CONNECT_ATTEMPTS must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn config_err(err: lib_utils::envs::Error) -> SyncError {
    SyncError::Validation(format!("Invalid configuration: {}", err))
}

/// Global configuration instance (initialized once at startup).
static CONFIG: OnceLock<SyncConfig> = OnceLock::new();

/// Initialize the global configuration from the environment.
///
/// Fails if a variable is malformed, validation fails, or the config was
/// already initialized.
pub fn init_config() -> Result<()> {
    let config = SyncConfig::from_env()?;
    config.validate()?;

    CONFIG
        .set(config)
        .map_err(|_| SyncError::Validation("Config has already been initialized".to_string()))
}

/// Global configuration, or the defaults when [`init_config`] was never called.
pub fn sync_config() -> &'static SyncConfig {
    CONFIG.get_or_init(SyncConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_url_from_api_url() {
        assert_eq!(push_url_from("http://127.0.0.1:3001"), "ws://127.0.0.1:3001/api/ws");
        assert_eq!(push_url_from("https://casino.example/"), "wss://casino.example/api/ws");
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.tx_failsafe, Duration::from_secs(120));
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let config = SyncConfig {
            api_base_url: "ftp://nope".to_string(),
            ..SyncConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SyncConfig {
            push_url: "http://not-a-socket".to_string(),
            ..SyncConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_failsafe() {
        let config = SyncConfig {
            tx_failsafe: Duration::ZERO,
            ..SyncConfig::default()
        };
        assert!(matches!(config.validate(), Err(SyncError::Validation(_))));
    }
}
