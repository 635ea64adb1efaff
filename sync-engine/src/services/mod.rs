//! # External Services
//!
//! - [`api`] - REST client for the Remote Data Service
//! - [`push`] - push channel transport

pub mod api;
pub mod push;

pub use api::ApiClient;
pub use push::{PushConnector, PushSocket, PushState, PushStatus, PushTransport, Subscription, WsConnector};
