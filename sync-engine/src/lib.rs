//! # Casino Front-End Sync Engine - Library Root
//!
//! Client-side state synchronization and transaction lifecycle for the casino
//! front-end. The engine keeps wallet network, token balances, affiliate data
//! and exchange rates fresh, and tracks user-submitted deposits, withdrawals
//! and swaps from submission to a terminal status.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │              sync-engine (this crate)                  │
//! ├────────────────────────────────────────────────────────┤
//! │  Tokio              - Async runtime, timers, watch     │
//! │  Reqwest            - Remote Data Service client       │
//! │  tokio-tungstenite  - Push channel                     │
//! │  async-channel      - Engine -> UI events              │
//! │  tracing            - Structured logging               │
//! └────────────────────────────────────────────────────────┘
//!          │                              │
//!          │ HTTP                         │ WebSocket
//!          ▼                              ▼
//! ┌─────────────────┐          ┌─────────────────────────┐
//! │  Remote Data    │          │   Push channel          │
//! │  Service        │          │   (user-{username})     │
//! └─────────────────┘          └─────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - **app**: [`SyncEngine`] orchestrator, [`SyncEvent`]s, session state
//! - **cache**: TTL-based staleness cache and its concrete instances
//! - **core**: errors, configuration, service traits
//! - **debug**: `tracing` subscriber setup
//! - **services**: HTTP client and push transport
//! - **storage**: durable key-value store and persistent flags
//! - **sync**: wallet network and token balance synchronization
//! - **transactions**: record store and lifecycle manager
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sync_engine::{init_config, sync_config, SyncEngine};
//!
//! init_config()?;
//! let (engine, events) = SyncEngine::from_config(sync_config(), wallet)?;
//! engine.start().await;
//! engine.login("alice", &jwt).await?;
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test -p sync-engine
//! ```

pub mod app;
pub mod cache;
pub mod core;
pub mod debug;
pub mod services;
pub mod storage;
pub mod sync;
pub mod transactions;

#[cfg(test)]
mod test_support;

pub use app::{SessionState, SyncEngine, SyncEvent};
pub use cache::{CacheEntry, CacheStatus, StalenessCache};
pub use crate::core::config::{init_config, sync_config};
pub use crate::core::{ApiService, Result, SyncConfig, SyncError, WalletConnector, WalletEvent, WalletProvider};
pub use services::{PushState, PushStatus};
pub use storage::{DurableStore, FileStore, MemoryStore};
pub use sync::NetworkState;
pub use transactions::{TransactionManager, TransactionRecord};
