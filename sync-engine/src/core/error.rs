//! # Common Error Types
//!
//! Consolidated error handling for the synchronization engine.
//!
//! ## Error Categories
//!
//! - **Api**: Remote Data Service failures (network, HTTP status, body parsing)
//! - **Storage**: durable key-value store I/O failures
//! - **Serialization**: a stored or received value did not (de)serialize
//! - **Resolution**: chain id or network metadata could not be determined
//! - **Transport**: push channel connection failures
//! - **Validation**: caller input rejected before any remote call
//!
//! None of these escape a background task. Caches turn them into an `error`
//! status, the network synchronizer turns them into a cleared state, and the
//! push transport turns them into a connection status.
//!
//! ```rust
//! use sync_engine::core::error::SyncError;
//!
//! let err = SyncError::Resolution("no network configured for chain 5".to_string());
//! assert_eq!(err.to_string(), "Resolution error: no network configured for chain 5");
//! ```

use thiserror::Error;

/// Engine-wide error type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// Remote Data Service call failed.
    #[error("API error: {0}")]
    Api(String),

    /// Durable store could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A value could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Chain id or network metadata could not be resolved.
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Push channel connection failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Input validation error.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Convenience type alias for `Result<T, SyncError>`.
pub type Result<T> = std::result::Result<T, SyncError>;

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Api(format!("Network error: {}", err))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SyncError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        SyncError::Transport(err.to_string())
    }
}
