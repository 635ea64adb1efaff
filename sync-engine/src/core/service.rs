//! # Service Traits
//!
//! Seams to the external collaborators of the engine: the Remote Data Service
//! and the wallet provider. Production code plugs in
//! [`crate::services::api::ApiClient`] and the host's wallet integration;
//! tests plug in in-memory mocks.

use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    AffiliateEarnings, AffiliateStats, DepositRequest, ExecutionResponse, HistoryPage,
    HistoryQuery, NetworkConfig, RateTable, Referral, SwapRequest, TokenBalance, TokenListQuery,
    WithdrawRequest,
};
use tokio::sync::broadcast;

use super::error::Result;

/// Remote Data Service operations consumed by the engine.
#[async_trait]
pub trait ApiService: Send + Sync {
    /// Token balances of a wallet on a chain
    async fn get_tokens(&self, query: &TokenListQuery) -> Result<Vec<TokenBalance>>;

    /// One page of the user's transaction history
    async fn get_transaction_history(&self, auth_token: &str, query: &HistoryQuery) -> Result<HistoryPage>;

    /// Execute a swap; the body distinguishes success from a business failure
    async fn execute_swap(&self, auth_token: &str, request: &SwapRequest) -> Result<ExecutionResponse>;

    async fn execute_deposit(&self, auth_token: &str, request: &DepositRequest) -> Result<ExecutionResponse>;

    async fn execute_withdraw(&self, auth_token: &str, request: &WithdrawRequest) -> Result<ExecutionResponse>;

    async fn get_affiliate_stats(&self, auth_token: &str) -> Result<AffiliateStats>;

    async fn get_affiliate_earnings(&self, auth_token: &str) -> Result<AffiliateEarnings>;

    async fn get_referrals(&self, auth_token: &str) -> Result<Vec<Referral>>;

    /// Public exchange rates; no authentication required
    async fn get_rates(&self) -> Result<RateTable>;
}

/// Wallet-provider notifications. They are triggers only: the synchronizer
/// always re-resolves the chain from the connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletEvent {
    NetworkChanged,
    PrimaryWalletChanged,
    Disconnected,
}

/// An active wallet connection.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Chain id the wallet is currently on
    async fn chain_id(&self) -> Result<u64>;

    /// Networks this connector knows how to describe
    fn networks(&self) -> Vec<NetworkConfig>;

    /// Address of the connected account
    fn address(&self) -> Option<String>;
}

/// Host wallet integration.
pub trait WalletProvider: Send + Sync {
    /// Connector of the primary wallet, if one is connected
    fn primary_connector(&self) -> Option<Arc<dyn WalletConnector>>;

    /// Stream of wallet events
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}
