use serde::{Deserialize, Serialize};

/// Error response body returned by the API on non-2xx statuses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}
