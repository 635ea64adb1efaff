//! Public exchange rates. Not user-scoped, so never cleared on logout.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use shared::RateTable;

use super::staleness::{FetchFn, StalenessCache};
use crate::core::service::ApiService;
use crate::storage::{keys, DurableStore};

pub type RatesCache = StalenessCache<RateTable>;

pub fn rates_cache(api: Arc<dyn ApiService>, store: Arc<dyn DurableStore>, ttl: Duration) -> RatesCache {
    let fetch: FetchFn<RateTable> = Arc::new(move || {
        let api = Arc::clone(&api);
        async move { api.get_rates().await }.boxed()
    });

    StalenessCache::new(keys::RATES_CACHE, ttl, store, fetch)
}
