use serde::{Deserialize, Serialize};

/// Token balance held by a wallet on one chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub symbol: String,
    pub name: String,
    /// Contract address, empty for the chain's native coin
    #[serde(default)]
    pub address: String,
    pub chain_id: u64,
    pub decimals: u8,
    /// Human-readable balance, e.g. `"12.000345"`
    pub balance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usd_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// Parameters of the token-list fetch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenListQuery {
    pub chain_id: u64,
    pub wallet_address: String,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_balance_keeps_amount_precision() {
        let json = r#"{
            "symbol": "USDC",
            "name": "USD Coin",
            "address": "0xa0b8",
            "chainId": 1,
            "decimals": 6,
            "balance": "123456789.123456789123456789"
        }"#;
        let token: TokenBalance = serde_json::from_str(json).unwrap();
        assert_eq!(token.balance, "123456789.123456789123456789");

        let back = serde_json::to_string(&token).unwrap();
        assert!(back.contains("\"123456789.123456789123456789\""));
        assert!(!back.contains("usdValue"));
    }
}
