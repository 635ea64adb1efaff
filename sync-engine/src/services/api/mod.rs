//! # Backend API Client Module
//!
//! HTTP client for the Remote Data Service.
//!
//! ## Module Structure
//!
//! ```text
//! api/
//! ├── mod.rs           - Module exports
//! ├── client.rs        - ApiClient, response decoding, ApiService impl
//! ├── tokens.rs        - Token balances
//! ├── transactions.rs  - Execution (swap/deposit/withdraw) and history
//! └── affiliate.rs     - Affiliate dashboard, referrals, rates
//! ```

pub mod affiliate;
pub mod client;
pub mod tokens;
pub mod transactions;

pub use client::ApiClient;
