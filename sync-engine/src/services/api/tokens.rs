//! # Token Endpoints

use shared::{truncate_address, TokenBalance, TokenListQuery};

use super::client::{read_json, ApiClient};
use crate::core::error::Result;

/// Token balances of `wallet_address` on `chain_id`.
#[tracing::instrument(skip(client), fields(chain_id = query.chain_id, user = %query.username, wallet = %truncate_address(&query.wallet_address)))]
pub async fn get_tokens(client: &ApiClient, query: &TokenListQuery) -> Result<Vec<TokenBalance>> {
    let response = client
        .client
        .get(client.url("/api/tokens"))
        .query(&[
            ("chainId", query.chain_id.to_string()),
            ("walletAddress", query.wallet_address.clone()),
            ("username", query.username.clone()),
        ])
        .send()
        .await?;

    let tokens: Vec<TokenBalance> = read_json(response).await?;
    tracing::debug!(count = tokens.len(), "Token balances received");
    Ok(tokens)
}
