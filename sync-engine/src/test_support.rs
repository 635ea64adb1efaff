//! In-memory collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use shared::{
    AffiliateEarnings, AffiliateStats, DepositRequest, ExecutionResponse, HistoryEntry,
    HistoryPage, HistoryQuery, NetworkConfig, RateTable, Referral, SwapRequest, TokenBalance,
    TokenListQuery, TransactionStatus, TransactionType, WithdrawRequest,
};
use tokio::sync::{broadcast, mpsc};

use crate::core::error::{Result, SyncError};
use crate::core::service::{ApiService, WalletConnector, WalletEvent, WalletProvider};
use crate::services::push::{PushConnector, PushSocket};

pub fn token(symbol: &str, chain_id: u64, balance: &str) -> TokenBalance {
    TokenBalance {
        symbol: symbol.to_string(),
        name: symbol.to_string(),
        address: String::new(),
        chain_id,
        decimals: 18,
        balance: balance.to_string(),
        usd_value: None,
        logo: None,
    }
}

pub fn network(chain_id: u64, name: &str) -> NetworkConfig {
    NetworkConfig {
        chain_id,
        name: name.to_lowercase(),
        vanity_name: name.to_string(),
        icon_url: Some(format!("https://icons.example/{}.svg", chain_id)),
    }
}

pub fn history_entry(tx_hash: &str, status: TransactionStatus) -> HistoryEntry {
    HistoryEntry {
        id: format!("remote-{}", tx_hash),
        tx_hash: tx_hash.to_string(),
        tx_type: TransactionType::Deposit,
        amount: "1.0".to_string(),
        token_symbol: "USDC".to_string(),
        network: "ethereum".to_string(),
        status,
        error: None,
        created_at: Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default(),
    }
}

/// Remote Data Service double with canned responses and call counters.
pub struct MockApi {
    pub tokens: Mutex<Vec<TokenBalance>>,
    pub token_queries: Mutex<Vec<TokenListQuery>>,
    pub history: Mutex<Vec<HistoryEntry>>,
    pub execution: Mutex<ExecutionResponse>,
    pub stats: Mutex<AffiliateStats>,
    pub earnings: Mutex<AffiliateEarnings>,
    pub referrals: Mutex<Vec<Referral>>,
    pub rates: Mutex<RateTable>,
    /// Errors returned, in order, before falling back to canned responses
    pub failures: Mutex<VecDeque<SyncError>>,
    pub calls: Mutex<Vec<&'static str>>,
    /// Artificial latency applied to every call
    pub delay: Mutex<Option<Duration>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            tokens: Mutex::new(vec![token("ETH", 1, "1.5")]),
            token_queries: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            execution: Mutex::new(ExecutionResponse::ok("0xabc")),
            stats: Mutex::new(AffiliateStats::default()),
            earnings: Mutex::new(AffiliateEarnings::default()),
            referrals: Mutex::new(Vec::new()),
            rates: Mutex::new(RateTable::default()),
            failures: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
        }
    }
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls_to(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == name).count()
    }

    pub fn fail_next(&self, error: SyncError) {
        self.failures.lock().push_back(error);
    }

    async fn enter(&self, name: &'static str) -> Result<()> {
        self.calls.lock().push(name);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.lock().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ApiService for MockApi {
    async fn get_tokens(&self, query: &TokenListQuery) -> Result<Vec<TokenBalance>> {
        self.token_queries.lock().push(query.clone());
        self.enter("get_tokens").await?;
        Ok(self.tokens.lock().clone())
    }

    async fn get_transaction_history(&self, _auth_token: &str, query: &HistoryQuery) -> Result<HistoryPage> {
        self.enter("get_transaction_history").await?;
        let items = self.history.lock().clone();
        Ok(HistoryPage {
            total: items.len() as u64,
            items,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn execute_swap(&self, _auth_token: &str, _request: &SwapRequest) -> Result<ExecutionResponse> {
        self.enter("execute_swap").await?;
        Ok(self.execution.lock().clone())
    }

    async fn execute_deposit(&self, _auth_token: &str, _request: &DepositRequest) -> Result<ExecutionResponse> {
        self.enter("execute_deposit").await?;
        Ok(self.execution.lock().clone())
    }

    async fn execute_withdraw(&self, _auth_token: &str, _request: &WithdrawRequest) -> Result<ExecutionResponse> {
        self.enter("execute_withdraw").await?;
        Ok(self.execution.lock().clone())
    }

    async fn get_affiliate_stats(&self, _auth_token: &str) -> Result<AffiliateStats> {
        self.enter("get_affiliate_stats").await?;
        Ok(self.stats.lock().clone())
    }

    async fn get_affiliate_earnings(&self, _auth_token: &str) -> Result<AffiliateEarnings> {
        self.enter("get_affiliate_earnings").await?;
        Ok(self.earnings.lock().clone())
    }

    async fn get_referrals(&self, _auth_token: &str) -> Result<Vec<Referral>> {
        self.enter("get_referrals").await?;
        Ok(self.referrals.lock().clone())
    }

    async fn get_rates(&self) -> Result<RateTable> {
        self.enter("get_rates").await?;
        Ok(self.rates.lock().clone())
    }
}

/// Wallet connector whose chain can be switched by the test.
pub struct MockConnector {
    pub chain: Mutex<Result<u64>>,
    pub networks: Vec<NetworkConfig>,
    pub address: Option<String>,
}

impl MockConnector {
    pub fn on_chain(chain_id: u64) -> Arc<Self> {
        Arc::new(Self {
            chain: Mutex::new(Ok(chain_id)),
            networks: vec![network(1, "Ethereum"), network(137, "Polygon"), network(8453, "Base")],
            address: Some("0x5290f0a3b8e4c1d2e3f4a5b6c7d8e9f0a1b29ee7".to_string()),
        })
    }

    pub fn switch_to(&self, chain_id: u64) {
        *self.chain.lock() = Ok(chain_id);
    }
}

#[async_trait]
impl WalletConnector for MockConnector {
    async fn chain_id(&self) -> Result<u64> {
        self.chain.lock().clone()
    }

    fn networks(&self) -> Vec<NetworkConfig> {
        self.networks.clone()
    }

    fn address(&self) -> Option<String> {
        self.address.clone()
    }
}

/// Wallet provider with a swappable primary connector.
pub struct MockWallet {
    pub connector: Mutex<Option<Arc<MockConnector>>>,
    pub events: broadcast::Sender<WalletEvent>,
}

impl MockWallet {
    pub fn connected(chain_id: u64) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            connector: Mutex::new(Some(MockConnector::on_chain(chain_id))),
            events,
        })
    }

    pub fn switch_to(&self, chain_id: u64) {
        if let Some(connector) = self.connector.lock().as_ref() {
            connector.switch_to(chain_id);
        }
        let _ = self.events.send(WalletEvent::NetworkChanged);
    }

    pub fn disconnect(&self) {
        *self.connector.lock() = None;
        let _ = self.events.send(WalletEvent::Disconnected);
    }
}

impl WalletProvider for MockWallet {
    fn primary_connector(&self) -> Option<Arc<dyn WalletConnector>> {
        self.connector
            .lock()
            .clone()
            .map(|c| c as Arc<dyn WalletConnector>)
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

/// Socket fed by the test through an mpsc sender.
pub struct MockSocket {
    frames: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl PushSocket for MockSocket {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        self.frames.recv().await.map(Ok)
    }
}

/// Push connector handing out [`MockSocket`]s; each accepted connection's
/// sender is exposed to the test.
#[derive(Default)]
pub struct MockPushConnector {
    pub channels: Mutex<Vec<String>>,
    pub senders: Mutex<Vec<mpsc::UnboundedSender<String>>>,
    /// Number of upcoming connection attempts to reject
    pub refuse: AtomicUsize,
}

impl MockPushConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connections(&self) -> usize {
        self.senders.lock().len()
    }

    /// Deliver a frame on the most recent connection.
    pub fn push(&self, frame: &str) -> bool {
        self.senders
            .lock()
            .last()
            .is_some_and(|tx| tx.send(frame.to_string()).is_ok())
    }

    /// Close the most recent connection from the server side.
    pub fn drop_connection(&self) {
        self.senders.lock().pop();
    }
}

#[async_trait]
impl PushConnector for MockPushConnector {
    async fn connect(&self, channel: &str) -> Result<Box<dyn PushSocket>> {
        self.channels.lock().push(channel.to_string());
        let refused = self
            .refuse
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(SyncError::Transport("connection refused".to_string()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().push(tx);
        Ok(Box::new(MockSocket { frames: rx }))
    }
}
