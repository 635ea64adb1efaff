//! # Transaction Endpoints
//!
//! Deposit/withdraw/swap execution and paginated history.

use serde::Serialize;
use shared::{ExecutionResponse, HistoryPage, HistoryQuery};

use super::client::{execution_from_body, read_json, ApiClient};
use crate::core::error::Result;

pub async fn get_transaction_history(
    client: &ApiClient,
    auth_token: &str,
    query: &HistoryQuery,
) -> Result<HistoryPage> {
    let request = client
        .client
        .get(client.url("/api/transactions/history"))
        .query(&query.to_query_pairs());
    let response = client.authed(request, auth_token).send().await?;
    read_json(response).await
}

/// POST an execution request to `path`.
#[tracing::instrument(skip(client, auth_token, request))]
pub async fn execute<R: Serialize + ?Sized>(
    client: &ApiClient,
    path: &str,
    auth_token: &str,
    request: &R,
) -> Result<ExecutionResponse> {
    tracing::info!("Executing transaction");
    let start = std::time::Instant::now();

    let builder = client.client.post(client.url(path)).json(request);
    let response = client.authed(builder, auth_token).send().await.map_err(|e| {
        tracing::error!(error = %e, "Execution network error");
        e
    })?;

    let status = response.status();
    let body = response.text().await?;
    let result = execution_from_body(status, &body);

    match &result {
        Ok(ExecutionResponse { success: true, tx_hash, .. }) => tracing::info!(
            tx_hash = tx_hash.as_deref().unwrap_or_default(),
            duration_ms = start.elapsed().as_millis(),
            "Execution accepted"
        ),
        Ok(ExecutionResponse { error, .. }) => tracing::warn!(
            status = status.as_u16(),
            error = error.as_deref().unwrap_or_default(),
            "Execution rejected"
        ),
        Err(e) => tracing::warn!(status = status.as_u16(), error = %e, "Execution failed"),
    }

    result
}
