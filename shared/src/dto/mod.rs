//! # Data Transfer Objects (DTOs)
//!
//! Everything that crosses the wire between the engine and the backend.
//!
//! ## Module Organization
//!
//! - [`tokens`] - Token balances for a wallet on a chain
//! - [`transactions`] - Deposit/withdraw/swap execution and history
//! - [`push`] - Push channel envelopes (`{type, data}`) and typed events
//! - [`network`] - Network metadata exposed by wallet connectors
//! - [`affiliate`] - Affiliate dashboard, referral list, exchange rates
//! - [`auth`] - API error body
//!
//! ## Example JSON Communication
//!
//! ```text
//! POST /api/swap/execute
//! { "fromToken": "USDC", "toToken": "ETH", "amount": "25.50", "chainId": 1,
//!   "walletAddress": "0x5290...9EE7", "slippageBps": 50 }
//!
//! HTTP/1.1 200 OK
//! { "success": true, "txHash": "0xabcd...6789" }
//! ```

pub mod affiliate;
pub mod auth;
pub mod network;
pub mod push;
pub mod tokens;
pub mod transactions;

pub use affiliate::*;
pub use auth::*;
pub use network::*;
pub use push::*;
pub use tokens::*;
pub use transactions::*;
