//! # Transactions
//!
//! Locally tracked deposit/withdraw/swap transactions and their lifecycle.

pub mod manager;
pub mod record;

pub use manager::{ResolveSource, TransactionManager, TIMEOUT_ERROR};
pub use record::{NewTransaction, TransactionRecord};
