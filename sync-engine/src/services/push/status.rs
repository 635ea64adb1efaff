use serde::Serialize;

/// Push connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PushState {
    /// Not connected (no user, or `disconnect()` was called)
    Disconnected,
    /// First connection attempt in progress
    Connecting,
    /// Connected and reading frames
    Connected,
    /// Waiting to retry after a failure or a dropped connection
    Reconnecting,
    /// Gave up after too many consecutive failures
    Disabled,
}

/// Observable status of the push transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushStatus {
    pub state: PushState,
    /// Consecutive attempts in the current connect/reconnect streak
    pub connection_attempts: u64,
    pub last_error: Option<String>,
    /// Epoch-ms of the last successful connection
    pub last_connected: Option<i64>,
    /// Frames received since `connect()`
    pub messages_received: u64,
    /// Epoch-ms of the last frame
    pub last_message: Option<i64>,
}

impl Default for PushStatus {
    fn default() -> Self {
        Self {
            state: PushState::Disconnected,
            connection_attempts: 0,
            last_error: None,
            last_connected: None,
            messages_received: 0,
            last_message: None,
        }
    }
}

impl PushStatus {
    pub fn is_connected(&self) -> bool {
        self.state == PushState::Connected
    }
}
