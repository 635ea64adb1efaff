//! # WebSocket Connector
//!
//! Production [`PushConnector`] over `tokio-tungstenite`. After the handshake
//! the client sends `{"type":"subscribe","channel":"user-<name>"}` and from
//! then on only receives.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace};

use super::{PushConnector, PushSocket};
use crate::core::error::Result;

pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl PushConnector for WsConnector {
    async fn connect(&self, channel: &str) -> Result<Box<dyn PushSocket>> {
        let (mut stream, response) = connect_async(self.url.as_str()).await?;
        info!(
            url = %self.url,
            status = ?response.status(),
            "Push connection established"
        );

        let subscribe = serde_json::json!({ "type": "subscribe", "channel": channel }).to_string();
        stream.send(Message::Text(subscribe.into())).await?;
        debug!(channel = %channel, "Subscribed to push channel");

        Ok(Box::new(WsSocket { stream }))
    }
}

struct WsSocket {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl PushSocket for WsSocket {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                Ok(Message::Ping(data)) => {
                    trace!(data_len = data.len(), "Received ping, sending pong");
                    if let Err(e) = self.stream.send(Message::Pong(data)).await {
                        return Some(Err(e.into()));
                    }
                }
                Ok(Message::Close(frame)) => {
                    info!(
                        code = ?frame.as_ref().map(|f| f.code),
                        reason = ?frame.as_ref().map(|f| f.reason.to_string()),
                        "Push connection closed by server"
                    );
                    return None;
                }
                Ok(_) => trace!("Ignoring non-text push frame"),
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
