//! # Session Orchestration
//!
//! - [`engine`] - [`SyncEngine`], which owns and wires every component
//! - [`events`] - [`SyncEvent`]s delivered to the UI
//! - [`state`] - [`SessionState`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! let (engine, events) = SyncEngine::from_config(sync_config(), wallet)?;
//! engine.start().await;
//! engine.login("alice", &jwt).await?;
//!
//! while let Ok(event) = events.recv().await {
//!     match event {
//!         SyncEvent::TransactionUpdated(record) => notify(record),
//!         _ => {}
//!     }
//! }
//! ```

pub mod engine;
pub mod events;
pub mod state;

pub use engine::SyncEngine;
pub use events::SyncEvent;
pub use state::{CurrentUser, SessionState};
