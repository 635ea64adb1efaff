//! # Push Transport
//!
//! Server-to-client notifications for deposit and withdraw status changes.
//!
//! - [`transport`] - connection lifecycle, reconnect backoff, per-channel subscribers
//! - [`ws`] - `tokio-tungstenite` connector
//! - [`status`] - observable connection status

pub mod status;
pub mod transport;
pub mod ws;

use async_trait::async_trait;

use crate::core::error::Result;

pub use status::{PushState, PushStatus};
pub use transport::{PushChannel, PushTransport, Subscription};
pub use ws::WsConnector;

/// An open push connection.
#[async_trait]
pub trait PushSocket: Send {
    /// Next text frame; `None` once the server closed the connection.
    async fn next_frame(&mut self) -> Option<Result<String>>;
}

/// Opens push connections subscribed to one channel.
#[async_trait]
pub trait PushConnector: Send + Sync {
    async fn connect(&self, channel: &str) -> Result<Box<dyn PushSocket>>;
}
