//! # Utilities Library
//!
//! Shared helpers for wall-clock time and environment variables.

pub mod envs;
pub mod time;

// Re-export commonly used functions
pub use envs::{get_env, get_env_bool, get_env_or, get_env_parse_or};
pub use time::{elapsed_millis, now_millis};
