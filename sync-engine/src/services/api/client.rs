//! # API Client
//!
//! `reqwest` implementation of [`ApiService`] against the backend REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    AffiliateEarnings, AffiliateStats, DepositRequest, ErrorResponse, ExecutionResponse,
    HistoryPage, HistoryQuery, RateTable, Referral, SwapRequest, TokenBalance, TokenListQuery,
    WithdrawRequest,
};

use crate::core::config::SyncConfig;
use crate::core::error::{Result, SyncError};
use crate::core::service::ApiService;

/// HTTP client for the Remote Data Service.
///
/// Holds one connection pool; clone the `Arc` around it rather than the client.
pub struct ApiClient {
    pub(crate) client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn authed(&self, builder: RequestBuilder, auth_token: &str) -> RequestBuilder {
        builder.header("Authorization", format!("Bearer {}", auth_token))
    }
}

/// Decode a 2xx body as `T`, anything else as an API error.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        serde_json::from_str(&body).map_err(|e| SyncError::Api(format!("Failed to parse response: {}", e)))
    } else {
        Err(error_from_body(status, &body))
    }
}

/// Prefer the `{error}` message the backend sends; fall back to the status line.
pub(crate) fn error_from_body(status: StatusCode, body: &str) -> SyncError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error }) => SyncError::Api(error),
        Err(_) => SyncError::Api(format!("HTTP {}", status)),
    }
}

/// Execution endpoints report business failures as `{success:false, error}`,
/// sometimes with a non-2xx status. Both shapes become an [`ExecutionResponse`].
pub(crate) fn execution_from_body(status: StatusCode, body: &str) -> Result<ExecutionResponse> {
    if let Ok(response) = serde_json::from_str::<ExecutionResponse>(body) {
        return Ok(response);
    }
    if status.is_success() {
        return Err(SyncError::Api(format!("Failed to parse response: {}", body)));
    }
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error }) if status.is_client_error() => Ok(ExecutionResponse::failed(error)),
        _ => Err(error_from_body(status, body)),
    }
}

#[async_trait]
impl ApiService for ApiClient {
    async fn get_tokens(&self, query: &TokenListQuery) -> Result<Vec<TokenBalance>> {
        super::tokens::get_tokens(self, query).await
    }

    async fn get_transaction_history(&self, auth_token: &str, query: &HistoryQuery) -> Result<HistoryPage> {
        super::transactions::get_transaction_history(self, auth_token, query).await
    }

    async fn execute_swap(&self, auth_token: &str, request: &SwapRequest) -> Result<ExecutionResponse> {
        super::transactions::execute(self, "/api/swap/execute", auth_token, request).await
    }

    async fn execute_deposit(&self, auth_token: &str, request: &DepositRequest) -> Result<ExecutionResponse> {
        super::transactions::execute(self, "/api/deposit", auth_token, request).await
    }

    async fn execute_withdraw(&self, auth_token: &str, request: &WithdrawRequest) -> Result<ExecutionResponse> {
        super::transactions::execute(self, "/api/withdraw", auth_token, request).await
    }

    async fn get_affiliate_stats(&self, auth_token: &str) -> Result<AffiliateStats> {
        super::affiliate::get_affiliate_stats(self, auth_token).await
    }

    async fn get_affiliate_earnings(&self, auth_token: &str) -> Result<AffiliateEarnings> {
        super::affiliate::get_affiliate_earnings(self, auth_token).await
    }

    async fn get_referrals(&self, auth_token: &str) -> Result<Vec<Referral>> {
        super::affiliate::get_referrals(self, auth_token).await
    }

    async fn get_rates(&self) -> Result<RateTable> {
        super::affiliate::get_rates(self).await
    }
}
