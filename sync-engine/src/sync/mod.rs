//! # Wallet-Driven Synchronization
//!
//! - [`network`] - wallet chain -> [`NetworkState`]
//! - [`tokens`] - [`NetworkState`] + session -> token balance cache

pub mod network;
pub mod tokens;

pub use network::{NetworkState, NetworkSynchronizer, ResolvedNetwork};
pub use tokens::TokenBalanceSync;
