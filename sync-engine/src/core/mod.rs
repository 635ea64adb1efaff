//! # Core Abstractions
//!
//! - **[`error`]**: [`SyncError`] and the `Result<T>` alias
//! - **[`config`]**: [`SyncConfig`] loaded from the environment
//! - **[`service`]**: traits for the Remote Data Service and the wallet provider

pub mod config;
pub mod error;
pub mod service;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use service::{ApiService, WalletConnector, WalletEvent, WalletProvider};
