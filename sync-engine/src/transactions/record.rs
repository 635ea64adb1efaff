use serde::{Deserialize, Serialize};
use shared::{TransactionStatus, TransactionType};

/// A locally tracked transaction, persisted under `transactions`.
///
/// The failsafe timer is runtime-only and lives in the manager, keyed by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub hash: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub amount: String,
    pub token_symbol: String,
    pub network: String,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Epoch-ms
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_token: Option<String>,
}

impl TransactionRecord {
    pub fn is_pending(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Matches a push or history update by hash, or by echoed record id.
    pub fn matches(&self, hash: &str, id: Option<&str>) -> bool {
        self.hash == hash || id == Some(self.id.as_str())
    }
}

/// Caller-supplied part of a record; the manager fills in id, status and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub hash: String,
    pub tx_type: TransactionType,
    pub amount: String,
    pub token_symbol: String,
    pub network: String,
    pub from_token: Option<String>,
    pub to_token: Option<String>,
}

impl NewTransaction {
    pub fn new(
        tx_type: TransactionType,
        hash: impl Into<String>,
        amount: impl Into<String>,
        token_symbol: impl Into<String>,
        network: impl Into<String>,
    ) -> Self {
        Self {
            hash: hash.into(),
            tx_type,
            amount: amount.into(),
            token_symbol: token_symbol.into(),
            network: network.into(),
            from_token: None,
            to_token: None,
        }
    }

    pub fn with_pair(mut self, from_token: impl Into<String>, to_token: impl Into<String>) -> Self {
        self.from_token = Some(from_token.into());
        self.to_token = Some(to_token.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_shape() {
        let record = TransactionRecord {
            id: "7f0c".to_string(),
            hash: "0xfeed".to_string(),
            tx_type: TransactionType::Swap,
            amount: "0.10".to_string(),
            token_symbol: "USDC".to_string(),
            network: "Base".to_string(),
            status: TransactionStatus::Pending,
            error: None,
            created_at: 1_700_000_000_000,
            from_token: Some("USDC".to_string()),
            to_token: Some("ETH".to_string()),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "swap");
        assert_eq!(json["tokenSymbol"], "USDC");
        assert_eq!(json["createdAt"], 1_700_000_000_000i64);
        assert_eq!(json["amount"], "0.10");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_matches_by_hash_or_id() {
        let record = TransactionRecord {
            id: "id-1".to_string(),
            hash: "0x01".to_string(),
            tx_type: TransactionType::Deposit,
            amount: "1".to_string(),
            token_symbol: "ETH".to_string(),
            network: "Ethereum".to_string(),
            status: TransactionStatus::Pending,
            error: None,
            created_at: 0,
            from_token: None,
            to_token: None,
        };
        assert!(record.matches("0x01", None));
        assert!(record.matches("0xother", Some("id-1")));
        assert!(!record.matches("0xother", Some("id-2")));
    }
}
