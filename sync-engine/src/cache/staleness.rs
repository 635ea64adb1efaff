//! # Staleness Cache
//!
//! One reusable primitive behind every fetched dataset: hydrate from durable
//! storage, refetch only when stale, and never run two fetches at once.
//!
//! ## Fetch rules
//!
//! - A fetch already in flight is joined, not repeated: every concurrent
//!   caller awaits the same shared future and observes the same result.
//! - Without `force`, a fetch is skipped while `now - last_fetched < ttl`.
//! - A failed fetch sets `status = Error` and keeps the previous `data`.
//! - `clear()` aborts the in-flight fetch and bumps an epoch; a result that
//!   belongs to an older epoch is never written back.
//!
//! ## Locking
//!
//! The in-flight slot is always locked before the state channel. Persistence
//! happens inside the state channel's write lock so that a concurrent
//! `clear()` cannot interleave between "persist" and "publish".

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use lib_utils::{elapsed_millis, now_millis};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::core::error::Result;
use crate::storage::{load_json, save_json, DurableStore};

/// Anything a cache can hold.
pub trait CacheData: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> CacheData for T where T: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Remote call(s) producing a fresh value.
pub type FetchFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Observable state of one cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub data: T,
    pub status: CacheStatus,
    /// Epoch-ms of the last successful fetch
    pub last_fetched: Option<i64>,
    pub is_initialized: bool,
    /// Message of the last failed fetch, cleared on the next attempt
    pub error: Option<String>,
}

impl<T: Default> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            status: CacheStatus::Idle,
            last_fetched: None,
            is_initialized: false,
            error: None,
        }
    }
}

/// Persisted shape: `{ data, timestamp }`
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry<T> {
    data: T,
    timestamp: i64,
}

#[derive(Serialize)]
struct StoredEntryRef<'a, T> {
    data: &'a T,
    timestamp: i64,
}

struct InFlight {
    generation: u64,
    future: Shared<BoxFuture<'static, ()>>,
    abort: AbortHandle,
}

struct CacheInner<T> {
    key: String,
    ttl: Duration,
    store: Arc<dyn DurableStore>,
    fetch: FetchFn<T>,
    state: watch::Sender<CacheEntry<T>>,
    in_flight: Mutex<Option<InFlight>>,
    epoch: AtomicU64,
    next_generation: AtomicU64,
}

/// Deduplicating, staleness-aware cache persisted under one storage key.
///
/// Cloning is cheap and every clone shares the same state.
pub struct StalenessCache<T> {
    inner: Arc<CacheInner<T>>,
}

impl<T> Clone for StalenessCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: CacheData> StalenessCache<T> {
    pub fn new(key: impl Into<String>, ttl: Duration, store: Arc<dyn DurableStore>, fetch: FetchFn<T>) -> Self {
        let (state, _) = watch::channel(CacheEntry::default());
        Self {
            inner: Arc::new(CacheInner {
                key: key.into(),
                ttl,
                store,
                fetch,
                state,
                in_flight: Mutex::new(None),
                epoch: AtomicU64::new(0),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Storage key, also used as the cache's name in logs
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn snapshot(&self) -> CacheEntry<T> {
        self.inner.state.borrow().clone()
    }

    pub fn data(&self) -> T {
        self.inner.state.borrow().data.clone()
    }

    pub fn status(&self) -> CacheStatus {
        self.inner.state.borrow().status
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<CacheEntry<T>> {
        self.inner.state.subscribe()
    }

    pub fn is_fetching(&self) -> bool {
        self.inner.in_flight.lock().is_some()
    }

    /// Hydrate from durable storage once, then fetch if nothing valid was stored.
    ///
    /// Repeated calls are no-ops unless `force` is set, in which case the
    /// store is re-read and a forced fetch always follows.
    pub async fn initialize(&self, force: bool) {
        if self.inner.state.borrow().is_initialized && !force {
            return;
        }

        let stored: Option<StoredEntry<T>> = load_json(self.inner.store.as_ref(), &self.inner.key);
        let has_valid_cache = stored
            .as_ref()
            .is_some_and(|entry| !self.inner.is_stale(Some(entry.timestamp)));

        debug!(
            cache = %self.inner.key,
            hydrated = stored.is_some(),
            valid = has_valid_cache,
            "Initializing cache"
        );

        self.inner.state.send_modify(|entry| {
            if let Some(stored) = stored {
                entry.data = stored.data;
                entry.last_fetched = Some(stored.timestamp);
                entry.status = CacheStatus::Success;
            }
            entry.is_initialized = true;
        });

        if !has_valid_cache || force {
            self.fetch_data(force).await;
        }
    }

    /// Fetch fresh data unless a fetch is running or the data is still fresh.
    ///
    /// A forced call that finds a fetch already running waits for it and
    /// then runs one trailing fetch, since the running one read its inputs
    /// before this call. Concurrent forced callers share that trailing fetch.
    /// It is skipped if the cache was cleared in the meantime.
    ///
    /// Completes when the (possibly shared) fetch has settled. Never fails:
    /// the outcome is recorded in [`CacheEntry::status`].
    pub async fn fetch_data(&self, force: bool) {
        let epoch = self.inner.epoch.load(Ordering::Acquire);
        // Generation of the fetch that was running when this call arrived
        let mut waited_on: Option<u64> = None;

        loop {
            let (future, joined) = {
                let mut slot = self.inner.in_flight.lock();

                if let Some(in_flight) = slot.as_ref() {
                    let started_after_call = waited_on.is_some_and(|g| in_flight.generation > g);
                    debug!(cache = %self.inner.key, started_after_call, "Joining in-flight fetch");
                    let joined = (force && !started_after_call).then_some(in_flight.generation);
                    (in_flight.future.clone(), joined)
                } else {
                    if waited_on.is_some() && self.inner.epoch.load(Ordering::Acquire) != epoch {
                        debug!(cache = %self.inner.key, "Cache cleared, dropping trailing fetch");
                        return;
                    }
                    match self.start_fetch(&mut slot, force) {
                        Some(future) => (future, None),
                        None => return,
                    }
                }
            };

            future.await;
            match joined {
                Some(generation) => waited_on = Some(generation),
                None => return,
            }
        }
    }

    /// Spawn a fetch into the empty in-flight slot, or `None` when the fetch
    /// rules say to skip it.
    fn start_fetch(&self, slot: &mut Option<InFlight>, force: bool) -> Option<Shared<BoxFuture<'static, ()>>> {
        {
            let entry = self.inner.state.borrow();
            if entry.status == CacheStatus::Loading && !force {
                return None;
            }
            if !force && !self.inner.is_stale(entry.last_fetched) {
                debug!(cache = %self.inner.key, "Cache still fresh, skipping fetch");
                return None;
            }
        }

        self.inner.state.send_modify(|entry| {
            entry.status = CacheStatus::Loading;
            entry.error = None;
        });

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let epoch = self.inner.epoch.load(Ordering::Acquire);
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let mut guard = FetchGuard {
                inner: Arc::clone(&inner),
                generation,
                epoch,
                completed: false,
            };
            inner.run_fetch(epoch).await;
            guard.completed = true;
        });
        let abort = handle.abort_handle();

        let key = self.inner.key.clone();
        let future = async move {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!(cache = %key, error = %e, "Fetch task ended abnormally");
                }
            }
        }
        .boxed()
        .shared();

        *slot = Some(InFlight {
            generation,
            future: future.clone(),
            abort,
        });
        Some(future)
    }

    /// Replace the in-memory data without fetching or persisting.
    pub fn set_data(&self, data: T) {
        self.inner.state.send_modify(|entry| entry.data = data);
    }

    /// Reset to initial values and drop the persisted copy.
    ///
    /// A fetch in flight is aborted and its result, should it still arrive,
    /// is discarded.
    pub fn clear(&self) {
        // Released before aborting: the fetch task's guard takes this lock on drop
        let in_flight = self.inner.in_flight.lock().take();
        if let Some(in_flight) = in_flight {
            in_flight.abort.abort();
        }

        let key = &self.inner.key;
        let store = &self.inner.store;
        let epoch = &self.inner.epoch;
        self.inner.state.send_modify(|entry| {
            epoch.fetch_add(1, Ordering::AcqRel);
            *entry = CacheEntry::default();
            if let Err(e) = store.remove(key) {
                warn!(cache = %key, error = %e, "Failed to remove persisted cache");
            }
        });

        info!(cache = %key, "Cache cleared");
    }
}

impl<T: CacheData> CacheInner<T> {
    fn is_stale(&self, last_fetched: Option<i64>) -> bool {
        match last_fetched {
            None => true,
            Some(at) => Duration::from_millis(elapsed_millis(at)) >= self.ttl,
        }
    }

    async fn run_fetch(&self, epoch: u64) {
        let result = (self.fetch)().await;

        let applied = self.state.send_if_modified(|entry| {
            // clear() bumps the epoch under this same lock
            if self.epoch.load(Ordering::Acquire) != epoch {
                return false;
            }

            match result {
                Ok(data) => {
                    let timestamp = now_millis();
                    let stored = StoredEntryRef { data: &data, timestamp };
                    if let Err(e) = save_json(self.store.as_ref(), &self.key, &stored) {
                        warn!(cache = %self.key, error = %e, "Failed to persist cache");
                    }
                    entry.data = data;
                    entry.last_fetched = Some(timestamp);
                    entry.status = CacheStatus::Success;
                    entry.error = None;
                    debug!(cache = %self.key, "Fetch succeeded");
                }
                Err(ref e) => {
                    warn!(cache = %self.key, error = %e, "Fetch failed, keeping previous data");
                    entry.status = CacheStatus::Error;
                    entry.error = Some(e.to_string());
                }
            }
            true
        });

        if !applied {
            debug!(cache = %self.key, "Discarding fetch result from before clear()");
        }
    }
}

/// Releases the in-flight slot however the fetch task ends, including panics
/// and aborts.
struct FetchGuard<T: CacheData> {
    inner: Arc<CacheInner<T>>,
    generation: u64,
    epoch: u64,
    completed: bool,
}

impl<T: CacheData> Drop for FetchGuard<T> {
    fn drop(&mut self) {
        let mut slot = self.inner.in_flight.lock();
        if slot.as_ref().is_some_and(|f| f.generation == self.generation) {
            *slot = None;
        }

        if !self.completed {
            let epoch = self.epoch;
            let current = &self.inner.epoch;
            self.inner.state.send_if_modified(|entry| {
                if current.load(Ordering::Acquire) != epoch || entry.status != CacheStatus::Loading {
                    return false;
                }
                entry.status = CacheStatus::Error;
                entry.error = Some("Fetch was interrupted".to_string());
                true
            });
        }
    }
}
