//! # Shared Data Transfer Objects Library
//!
//! The contract between the casino front-end engine and the backend API,
//! including the push channel frames.
//!
//! ## Structure
//!
//! - **[`dto`]**: Data Transfer Objects
//!   - **[`dto::tokens`]**: token balances and the token-list query
//!   - **[`dto::transactions`]**: execution requests/results and transaction history
//!   - **[`dto::push`]**: push envelopes and the typed events validated from them
//!   - **[`dto::network`]**: chain metadata known to a wallet connector
//!   - **[`dto::affiliate`]**: affiliate dashboard, referrals and exchange rates
//!   - **[`dto::auth`]**: error body returned by the API
//! - **[`utils`]**: display helpers for addresses and hashes
//!
//! ## Wire Format
//!
//! JSON with **camelCase** field names, matching what the backend emits to the
//! browser client. Monetary amounts are always strings so that no precision is
//! lost through `f64`.

pub mod dto;
pub mod utils;

pub use dto::*;
pub use utils::*;
