//! # Token Balance Sync
//!
//! Refreshes the token cache when the chain or the user changes, and clears
//! it when either the chain or the session goes away.
//!
//! Only a *change* triggers a fetch: the `(chain, user)` pair last fetched
//! for is remembered, so repeated notifications for the same pair (a wallet
//! that emits "network changed" twice, or a session refresh) cost nothing.
//! [`TokenBalanceSync::reset`] forgets the pair, so the next notification
//! always fetches.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use super::network::NetworkState;
use crate::app::state::SessionState;
use crate::cache::TokenCache;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Fetch(u64),
    Clear,
    Skip,
}

/// What the cache currently holds balances for
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fetched {
    chain_id: u64,
    username: String,
}

pub struct TokenBalanceSync {
    cache: TokenCache,
    last_fetched: Mutex<Option<Fetched>>,
    task: Mutex<Option<AbortHandle>>,
}

impl TokenBalanceSync {
    pub fn new(cache: TokenCache) -> Arc<Self> {
        Arc::new(Self {
            cache,
            last_fetched: Mutex::new(None),
            task: Mutex::new(None),
        })
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    pub fn last_fetched_chain(&self) -> Option<u64> {
        self.last_fetched.lock().as_ref().map(|f| f.chain_id)
    }

    /// React to network and session changes until [`stop`](Self::stop).
    pub fn start(
        self: &Arc<Self>,
        mut network: watch::Receiver<NetworkState>,
        mut session: watch::Receiver<SessionState>,
    ) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                let chain_id = network.borrow_and_update().chain_id();
                let username = {
                    let session = session.borrow_and_update();
                    session
                        .is_authenticated()
                        .then(|| session.username().map(str::to_string))
                        .flatten()
                };
                this.on_change(chain_id, username.as_deref()).await;

                tokio::select! {
                    changed = network.changed() => if changed.is_err() { break },
                    changed = session.changed() => if changed.is_err() { break },
                }
            }
            debug!("Token balance sync inputs closed");
        });
        *task = Some(handle.abort_handle());
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }

    /// `username` is `Some` only for an authenticated session.
    pub async fn on_change(&self, chain_id: Option<u64>, username: Option<&str>) {
        match self.decide(chain_id, username) {
            Action::Fetch(chain_id) => {
                info!(chain_id, user = ?username, "Chain or user changed, refreshing token balances");
                self.cache.fetch_data(true).await;
            }
            Action::Clear => {
                debug!("No chain or no session, clearing token balances");
                self.cache.clear();
            }
            Action::Skip => debug!(?chain_id, "Token balances already fetched for chain and user"),
        }
    }

    /// Forced refetch for the tracked chain, e.g. after a transaction settles.
    pub async fn invalidate(&self) {
        if self.last_fetched_chain().is_some() {
            debug!("Invalidating token balances");
            self.cache.fetch_data(true).await;
        }
    }

    /// Clear the cache and forget what it was fetched for.
    pub fn reset(&self) {
        *self.last_fetched.lock() = None;
        self.cache.clear();
    }

    fn decide(&self, chain_id: Option<u64>, username: Option<&str>) -> Action {
        let mut last = self.last_fetched.lock();
        match (chain_id, username) {
            (Some(chain_id), Some(username)) => {
                let unchanged = last
                    .as_ref()
                    .is_some_and(|f| f.chain_id == chain_id && f.username == username);
                if unchanged {
                    Action::Skip
                } else {
                    *last = Some(Fetched {
                        chain_id,
                        username: username.to_string(),
                    });
                    Action::Fetch(chain_id)
                }
            }
            _ => {
                *last = None;
                Action::Clear
            }
        }
    }
}
