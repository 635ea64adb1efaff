//! Token balances of the connected wallet on the current chain.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use shared::{TokenBalance, TokenListQuery};
use tracing::debug;

use super::staleness::{FetchFn, StalenessCache};
use crate::core::error::SyncError;
use crate::core::service::ApiService;
use crate::storage::{keys, DurableStore};

pub type TokenCache = StalenessCache<Vec<TokenBalance>>;

/// Reads `(chain, wallet, user)` at fetch time; `None` when any is missing.
pub type TokenQuerySource = Arc<dyn Fn() -> Option<TokenListQuery> + Send + Sync>;

pub fn token_cache(
    api: Arc<dyn ApiService>,
    store: Arc<dyn DurableStore>,
    ttl: Duration,
    query: TokenQuerySource,
) -> TokenCache {
    let fetch: FetchFn<Vec<TokenBalance>> = Arc::new(move || {
        let api = Arc::clone(&api);
        let query = query();
        async move {
            let query = query.ok_or_else(|| {
                SyncError::Validation("Token balances need a chain, a wallet and a logged-in user".to_string())
            })?;
            debug!(chain_id = query.chain_id, user = %query.username, "Fetching token balances");
            api.get_tokens(&query).await
        }
        .boxed()
    });

    StalenessCache::new(keys::TOKENS_CACHE, ttl, store, fetch)
}
