use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of on-chain operation a transaction record tracks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdraw,
    Swap,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdraw => "withdraw",
            TransactionType::Swap => "swap",
        }
    }
}

/// Lifecycle status of a transaction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[serde(alias = "processing")]
    Pending,
    #[serde(alias = "completed", alias = "success")]
    Confirmed,
    #[serde(alias = "error", alias = "rejected")]
    Failed,
}

impl TransactionStatus {
    /// `confirmed` and `failed` admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Confirmed => "confirmed",
            TransactionStatus::Failed => "failed",
        }
    }
}

/// Result of a swap/deposit/withdraw execution call.
///
/// The backend answers `{success: true, txHash}` or `{success: false, error}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResponse {
    pub fn ok(tx_hash: impl Into<String>) -> Self {
        Self {
            success: true,
            tx_hash: Some(tx_hash.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            tx_hash: None,
            error: Some(error.into()),
        }
    }

    /// Transaction hash on success, error message otherwise.
    ///
    /// A `success: true` body without a hash is treated as a failure since
    /// nothing could be tracked.
    pub fn into_result(self) -> Result<String, String> {
        match (self.success, self.tx_hash) {
            (true, Some(hash)) if !hash.is_empty() => Ok(hash),
            (true, _) => Err("Execution succeeded but no transaction hash was returned".to_string()),
            (false, _) => Err(self.error.unwrap_or_else(|| "Execution failed".to_string())),
        }
    }
}

/// Swap execution request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub from_token: String,
    pub to_token: String,
    pub amount: String,
    pub chain_id: u64,
    pub wallet_address: String,
    pub slippage_bps: u16,
}

/// Deposit execution request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    pub token_symbol: String,
    pub amount: String,
    pub chain_id: u64,
    pub wallet_address: String,
}

/// Withdraw execution request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub token_symbol: String,
    pub amount: String,
    pub chain_id: u64,
    pub destination_address: String,
}

/// Filters and pagination for the transaction history fetch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
    pub page: u32,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<TransactionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            page: 1,
            limit: 20,
            tx_type: None,
            status: None,
        }
    }
}

impl HistoryQuery {
    /// Query-string pairs in the order the API documents them.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(from) = self.from {
            pairs.push(("from", from.to_rfc3339()));
        }
        if let Some(to) = self.to {
            pairs.push(("to", to.to_rfc3339()));
        }
        if let Some(tx_type) = self.tx_type {
            pairs.push(("type", tx_type.as_str().to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        pairs
    }
}

/// One row of remote transaction history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub tx_hash: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub amount: String,
    pub token_symbol: String,
    #[serde(default)]
    pub network: String,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Paginated history response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub items: Vec<HistoryEntry>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}
