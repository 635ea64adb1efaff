//! # Sync Engine
//!
//! Owns every component and wires them together. The engine is the only
//! place that connects or disconnects the push transport.
//!
//! ```text
//!  wallet events ──> NetworkSynchronizer ──watch──> TokenBalanceSync ──> token cache
//!                                                         ^
//!  login/logout ───> SessionState ─────────watch──────────┘
//!
//!  push frames ──> PushTransport ──> TransactionManager ──resolved──> token invalidate
//!  submit_* ──> ApiService ──> TransactionManager::add_transaction
//!
//!  every component ──> SyncEvent ──async_channel──> UI
//! ```

use std::sync::Arc;

use async_channel::{Receiver, Sender};
use parking_lot::Mutex;
use shared::{DepositRequest, HistoryQuery, SwapRequest, TokenListQuery, TransactionType, WithdrawRequest};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use super::events::SyncEvent;
use super::state::SessionState;
use crate::cache::{
    affiliate_cache, rates_cache, referral_cache, token_cache, AffiliateCache, AuthSource, CacheData,
    RatesCache, ReferralCache, StalenessCache, TokenCache, TokenQuerySource,
};
use crate::core::config::SyncConfig;
use crate::core::error::{Result, SyncError};
use crate::core::service::{ApiService, WalletProvider};
use crate::services::api::ApiClient;
use crate::services::push::{PushConnector, PushTransport, WsConnector};
use crate::storage::{DurableStore, FileStore, FlagStore};
use crate::sync::network::{NetworkState, NetworkSynchronizer};
use crate::sync::tokens::TokenBalanceSync;
use crate::transactions::{NewTransaction, TransactionManager, TransactionRecord};

pub struct SyncEngine {
    api: Arc<dyn ApiService>,
    session: watch::Sender<SessionState>,
    network: Arc<NetworkSynchronizer>,
    token_sync: Arc<TokenBalanceSync>,
    affiliate: AffiliateCache,
    referrals: ReferralCache,
    rates: RatesCache,
    transactions: TransactionManager,
    push: PushTransport,
    flags: FlagStore,
    events: Sender<SyncEvent>,
    tasks: Mutex<Vec<AbortHandle>>,
}

impl SyncEngine {
    /// Assemble an engine from its collaborators. Nothing runs until [`start`](Self::start).
    pub fn new(
        config: &SyncConfig,
        api: Arc<dyn ApiService>,
        wallet: Arc<dyn WalletProvider>,
        store: Arc<dyn DurableStore>,
        push_connector: Arc<dyn PushConnector>,
    ) -> (Arc<Self>, Receiver<SyncEvent>) {
        let (events, events_rx) = async_channel::unbounded();
        let (session, _) = watch::channel(SessionState::default());
        let network = NetworkSynchronizer::new(Arc::clone(&wallet));

        let token_query: TokenQuerySource = {
            let network = network.subscribe();
            let session = session.subscribe();
            let wallet = Arc::clone(&wallet);
            Arc::new(move || {
                let chain_id = network.borrow().chain_id()?;
                let username = session.borrow().username()?.to_string();
                let wallet_address = wallet.primary_connector()?.address()?;
                Some(TokenListQuery {
                    chain_id,
                    wallet_address,
                    username,
                })
            })
        };
        let auth: AuthSource = {
            let session = session.subscribe();
            Arc::new(move || session.borrow().auth_token.clone())
        };

        let ttl = config.cache_ttl;
        let tokens = token_cache(Arc::clone(&api), Arc::clone(&store), ttl, token_query);
        let engine = Arc::new(Self {
            session,
            token_sync: TokenBalanceSync::new(tokens),
            network,
            affiliate: affiliate_cache(Arc::clone(&api), Arc::clone(&store), ttl, Arc::clone(&auth)),
            referrals: referral_cache(Arc::clone(&api), Arc::clone(&store), ttl, auth),
            rates: rates_cache(Arc::clone(&api), Arc::clone(&store), ttl),
            transactions: TransactionManager::new(Arc::clone(&store), config.tx_failsafe),
            push: PushTransport::new(push_connector, config.push_max_connect_attempts),
            flags: FlagStore::load(store),
            api,
            events,
            tasks: Mutex::new(Vec::new()),
        });

        (engine, events_rx)
    }

    /// Production wiring: `reqwest` API client, file store, WebSocket push.
    pub fn from_config(config: &SyncConfig, wallet: Arc<dyn WalletProvider>) -> Result<(Arc<Self>, Receiver<SyncEvent>)> {
        config.validate()?;
        let api = Arc::new(ApiClient::new(config)?);
        let store = Arc::new(FileStore::open(&config.storage_dir)?);
        let push = Arc::new(WsConnector::new(config.push_url.clone()));
        Ok(Self::new(config, api, wallet, store, push))
    }

    /// Start background synchronization and load public data.
    pub async fn start(self: &Arc<Self>) {
        // Forwarders subscribe first so the initial resolution is observed
        let tasks = vec![
            self.spawn_resolved_fanout(),
            forward_watch(self.network.subscribe(), self.events.clone(), SyncEvent::NetworkChanged),
            forward_watch(self.push.subscribe_status(), self.events.clone(), SyncEvent::PushStatus),
            forward_cache(self.token_sync.cache(), self.events.clone()),
            forward_cache(&self.affiliate, self.events.clone()),
            forward_cache(&self.referrals, self.events.clone()),
            forward_cache(&self.rates, self.events.clone()),
        ];
        self.tasks.lock().extend(tasks);

        self.network.start();
        self.token_sync.start(self.network.subscribe(), self.session.subscribe());
        self.transactions.attach_push(&self.push);

        self.rates.initialize(false).await;
        info!("Sync engine started");
    }

    /// Establish the session and load everything user-scoped.
    ///
    /// Logging in as a different user first logs the current one out.
    pub async fn login(&self, username: &str, auth_token: &str) -> Result<()> {
        if username.trim().is_empty() || auth_token.is_empty() {
            return Err(SyncError::Validation("Username and auth token are required".to_string()));
        }

        let current = self.session().username().map(str::to_string);
        if current.as_deref().is_some_and(|u| u != username) {
            info!(previous = ?current, next = %username, "Switching user");
            self.logout();
        }

        self.session.send_replace(SessionState::logged_in(username, auth_token));
        self.emit(SyncEvent::SessionChanged {
            username: Some(username.to_string()),
        })
        .await;
        info!(user = %username, "Logged in");

        self.push.connect(username);
        self.transactions.initialize_transactions();

        match self.api.get_transaction_history(auth_token, &HistoryQuery::default()).await {
            Ok(page) => {
                self.transactions.reconcile(&page.items);
            }
            Err(e) => warn!(error = %e, "Skipping history reconciliation"),
        }

        tokio::join!(self.affiliate.initialize(false), self.referrals.initialize(false));
        Ok(())
    }

    /// Tear down everything user-scoped. Rates and flags survive.
    pub fn logout(&self) {
        self.push.disconnect();
        self.transactions.clear_transactions();
        self.token_sync.reset();
        self.affiliate.clear();
        self.referrals.clear();
        self.session.send_replace(SessionState::default());
        // Unbounded channel: only fails once closed by shutdown()
        let _ = self.events.try_send(SyncEvent::SessionChanged { username: None });
        info!("Logged out");
    }

    pub async fn submit_deposit(&self, request: DepositRequest) -> Result<TransactionRecord> {
        let auth_token = self.require_auth()?;
        let response = self.api.execute_deposit(&auth_token, &request).await?;
        let hash = response.into_result().map_err(SyncError::Api)?;

        let new = NewTransaction::new(
            TransactionType::Deposit,
            hash,
            request.amount,
            request.token_symbol,
            self.network_name(),
        );
        Ok(self.track(new).await)
    }

    pub async fn submit_withdraw(&self, request: WithdrawRequest) -> Result<TransactionRecord> {
        let auth_token = self.require_auth()?;
        let response = self.api.execute_withdraw(&auth_token, &request).await?;
        let hash = response.into_result().map_err(SyncError::Api)?;

        let new = NewTransaction::new(
            TransactionType::Withdraw,
            hash,
            request.amount,
            request.token_symbol,
            self.network_name(),
        );
        Ok(self.track(new).await)
    }

    pub async fn submit_swap(&self, request: SwapRequest) -> Result<TransactionRecord> {
        let auth_token = self.require_auth()?;
        let response = self.api.execute_swap(&auth_token, &request).await?;
        let hash = response.into_result().map_err(SyncError::Api)?;

        let new = NewTransaction::new(
            TransactionType::Swap,
            hash,
            request.amount,
            request.from_token.clone(),
            self.network_name(),
        )
        .with_pair(request.from_token, request.to_token);
        Ok(self.track(new).await)
    }

    /// Stop every task and timer and drop every subscription.
    pub fn shutdown(&self) {
        self.network.stop();
        self.token_sync.stop();
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.transactions.shutdown();
        self.push.disconnect();
        self.events.close();
        info!("Sync engine shut down");
    }

    pub fn session(&self) -> SessionState {
        self.session.borrow().clone()
    }

    pub fn network_state(&self) -> NetworkState {
        self.network.state()
    }

    pub fn tokens(&self) -> &TokenCache {
        self.token_sync.cache()
    }

    pub fn affiliate(&self) -> &AffiliateCache {
        &self.affiliate
    }

    pub fn referrals(&self) -> &ReferralCache {
        &self.referrals
    }

    pub fn rates(&self) -> &RatesCache {
        &self.rates
    }

    pub fn transactions(&self) -> &TransactionManager {
        &self.transactions
    }

    pub fn push(&self) -> &PushTransport {
        &self.push
    }

    pub fn flags(&self) -> &FlagStore {
        &self.flags
    }

    fn require_auth(&self) -> Result<String> {
        self.session
            .borrow()
            .auth_token
            .clone()
            .ok_or_else(|| SyncError::Validation("Not logged in".to_string()))
    }

    fn network_name(&self) -> String {
        self.network
            .state()
            .network()
            .map(|n| n.vanity_name.clone())
            .unwrap_or_default()
    }

    async fn track(&self, new: NewTransaction) -> TransactionRecord {
        // The confirmation will arrive over push; make sure it can
        if let Some(username) = self.session().username() {
            self.push.connect(username);
        }
        let record = self.transactions.add_transaction(new);
        self.emit(SyncEvent::TransactionAdded(record.clone())).await;
        record
    }

    async fn emit(&self, event: SyncEvent) {
        if self.events.send(event).await.is_err() {
            debug!("Event channel closed, dropping event");
        }
    }

    /// Resolved transactions become UI events and a token refresh.
    fn spawn_resolved_fanout(&self) -> AbortHandle {
        let mut resolved = self.transactions.subscribe_resolved();
        let token_sync = Arc::clone(&self.token_sync);
        let events = self.events.clone();
        tokio::spawn(async move {
            loop {
                match resolved.recv().await {
                    Ok(record) => {
                        let _ = events.send(SyncEvent::TransactionUpdated(record)).await;
                        token_sync.invalidate().await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Resolved transactions lagged, refreshing balances");
                        token_sync.invalidate().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
        .abort_handle()
    }
}

fn forward_watch<T, F>(mut rx: watch::Receiver<T>, events: Sender<SyncEvent>, to_event: F) -> AbortHandle
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T) -> SyncEvent + Send + 'static,
{
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let value = rx.borrow_and_update().clone();
            if events.send(to_event(value)).await.is_err() {
                break;
            }
        }
    })
    .abort_handle()
}

/// Forward status transitions only; data-only changes (`set_data`) are silent.
fn forward_cache<T: CacheData>(cache: &StalenessCache<T>, events: Sender<SyncEvent>) -> AbortHandle {
    let mut rx = cache.subscribe();
    let key = cache.key().to_string();
    tokio::spawn(async move {
        let mut last = rx.borrow_and_update().status;
        while rx.changed().await.is_ok() {
            let (status, error) = {
                let entry = rx.borrow_and_update();
                (entry.status, entry.error.clone())
            };
            if status == last {
                continue;
            }
            last = status;
            let event = SyncEvent::CacheStatus {
                cache: key.clone(),
                status,
                error,
            };
            if events.send(event).await.is_err() {
                break;
            }
        }
    })
    .abort_handle()
}
