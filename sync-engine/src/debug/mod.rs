//! # Logging
//!
//! `tracing` subscriber setup for hosts embedding the engine.
//!
//! ```rust,no_run
//! use sync_engine::debug::{logger, LogConfig};
//!
//! let _guard = logger::init(&LogConfig::from_env());
//! ```

pub mod config;
pub mod logger;

pub use config::LogConfig;
