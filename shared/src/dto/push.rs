//! Push channel frames.
//!
//! Frames arrive as `{type, data}`. They are parsed into a loose
//! [`PushEnvelope`] first and only then validated into a [`PushEvent`], so an
//! unknown `type` or a malformed payload is rejected at the boundary instead
//! of failing the whole stream.

use serde::{Deserialize, Serialize};

use super::transactions::TransactionStatus;

/// Raw frame as received on the socket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Status update for a deposit or withdraw
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    #[serde(alias = "hash")]
    pub tx_hash: String,
    /// Client-side record id, echoed back by some backend paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Validated push event
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Deposit(TransactionUpdate),
    Withdraw(TransactionUpdate),
    /// Chat traffic shares the socket; the engine does not interpret it
    Chat(serde_json::Value),
}

/// Why a frame was not turned into a [`PushEvent`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushFrameError {
    Malformed(String),
    UnknownType(String),
    InvalidPayload { kind: String, reason: String },
}

impl std::fmt::Display for PushFrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PushFrameError::Malformed(reason) => write!(f, "malformed frame: {}", reason),
            PushFrameError::UnknownType(kind) => write!(f, "unknown event type: {}", kind),
            PushFrameError::InvalidPayload { kind, reason } => {
                write!(f, "invalid {} payload: {}", kind, reason)
            }
        }
    }
}

impl std::error::Error for PushFrameError {}

impl PushEvent {
    /// Parse and validate one text frame.
    pub fn parse(text: &str) -> Result<Self, PushFrameError> {
        let envelope: PushEnvelope =
            serde_json::from_str(text).map_err(|e| PushFrameError::Malformed(e.to_string()))?;
        Self::from_envelope(envelope)
    }

    pub fn from_envelope(envelope: PushEnvelope) -> Result<Self, PushFrameError> {
        let PushEnvelope { kind, data } = envelope;
        match kind.as_str() {
            "deposit" => Self::update(&kind, data).map(PushEvent::Deposit),
            "withdraw" => Self::update(&kind, data).map(PushEvent::Withdraw),
            "chat" => Ok(PushEvent::Chat(data)),
            _ => Err(PushFrameError::UnknownType(kind)),
        }
    }

    fn update(kind: &str, data: serde_json::Value) -> Result<TransactionUpdate, PushFrameError> {
        serde_json::from_value(data).map_err(|e| PushFrameError::InvalidPayload {
            kind: kind.to_string(),
            reason: e.to_string(),
        })
    }
}
