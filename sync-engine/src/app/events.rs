//! # Engine Events
//!
//! Notifications sent from background tasks to the UI over an unbounded
//! `async_channel`.

use crate::cache::CacheStatus;
use crate::services::push::PushStatus;
use crate::sync::network::NetworkState;
use crate::transactions::TransactionRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Wallet network resolved or cleared
    NetworkChanged(NetworkState),
    /// A cache moved to a new status; `cache` is its storage key
    CacheStatus {
        cache: String,
        status: CacheStatus,
        error: Option<String>,
    },
    /// A transaction was submitted and is now tracked as pending
    TransactionAdded(TransactionRecord),
    /// A tracked transaction reached a terminal status
    TransactionUpdated(TransactionRecord),
    /// Push connection status changed
    PushStatus(PushStatus),
    /// Logged in (`Some`) or out (`None`)
    SessionChanged { username: Option<String> },
}
