//! # Network Identity Synchronizer
//!
//! Keeps [`NetworkState`] in line with the wallet's current chain. Wallet
//! events are only triggers: every run re-resolves the chain id from the
//! primary connector, so a late or duplicated event can never leave stale
//! state behind.
//!
//! One task handles events in arrival order, which means state writes never
//! interleave. Readers observe changes through a `watch` channel; that
//! channel is the chain-changed signal the token sync listens to.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use shared::NetworkInfo;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::core::error::{Result, SyncError};
use crate::core::service::{WalletConnector, WalletProvider};

/// Chain the wallet is on, with its display metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedNetwork {
    pub network: NetworkInfo,
    pub chain_id: u64,
    pub chain_logo: Option<String>,
}

/// Either fully resolved or fully cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkState {
    resolved: Option<ResolvedNetwork>,
}

impl NetworkState {
    pub fn resolved(resolved: ResolvedNetwork) -> Self {
        Self {
            resolved: Some(resolved),
        }
    }

    pub fn network(&self) -> Option<&NetworkInfo> {
        self.resolved.as_ref().map(|r| &r.network)
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.resolved.as_ref().map(|r| r.chain_id)
    }

    pub fn chain_logo(&self) -> Option<&str> {
        self.resolved.as_ref().and_then(|r| r.chain_logo.as_deref())
    }

    pub fn is_cleared(&self) -> bool {
        self.resolved.is_none()
    }

    pub fn as_resolved(&self) -> Option<&ResolvedNetwork> {
        self.resolved.as_ref()
    }
}

pub struct NetworkSynchronizer {
    wallet: Arc<dyn WalletProvider>,
    state: watch::Sender<NetworkState>,
    task: Mutex<Option<AbortHandle>>,
}

impl NetworkSynchronizer {
    pub fn new(wallet: Arc<dyn WalletProvider>) -> Arc<Self> {
        let (state, _) = watch::channel(NetworkState::default());
        Arc::new(Self {
            wallet,
            state,
            task: Mutex::new(None),
        })
    }

    pub fn state(&self) -> NetworkState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkState> {
        self.state.subscribe()
    }

    /// Sync once now, then again on every wallet event until [`stop`](Self::stop).
    pub fn start(self: &Arc<Self>) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        // Subscribe before the eager run so no event slips in between
        let mut events = self.wallet.subscribe();
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            this.sync_once().await;
            loop {
                match events.recv().await {
                    Ok(event) => {
                        debug!(?event, "Wallet event received");
                        this.sync_once().await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Wallet events lagged, resyncing");
                        this.sync_once().await;
                    }
                    Err(RecvError::Closed) => {
                        debug!("Wallet event stream closed");
                        break;
                    }
                }
            }
        });
        *task = Some(handle.abort_handle());
        info!("Network synchronizer started");
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            info!("Network synchronizer stopped");
        }
    }

    /// Re-resolve the chain from the primary connector and publish the result.
    pub async fn sync_once(&self) {
        let Some(connector) = self.wallet.primary_connector() else {
            debug!("No active wallet connector, clearing network state");
            self.publish(NetworkState::default());
            return;
        };

        match resolve(connector.as_ref()).await {
            Ok(resolved) => {
                info!(
                    chain_id = resolved.chain_id,
                    network = %resolved.network.vanity_name,
                    "Network resolved"
                );
                self.publish(NetworkState::resolved(resolved));
            }
            Err(e) => {
                warn!(error = %e, "Could not resolve wallet network, clearing state");
                self.publish(NetworkState::default());
            }
        }
    }

    fn publish(&self, next: NetworkState) {
        self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        });
    }
}

async fn resolve(connector: &dyn WalletConnector) -> Result<ResolvedNetwork> {
    let chain_id = connector.chain_id().await?;
    let config = connector
        .networks()
        .into_iter()
        .find(|n| n.chain_id == chain_id)
        .ok_or_else(|| SyncError::Resolution(format!("no network configured for chain {}", chain_id)))?;

    Ok(ResolvedNetwork {
        network: config.info(),
        chain_id,
        chain_logo: config.icon_url,
    })
}
