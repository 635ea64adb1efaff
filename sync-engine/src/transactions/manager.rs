//! # Transaction Lifecycle Manager
//!
//! Tracks deposit, withdraw and swap transactions from submission until a
//! terminal status, reconciling three sources that race each other:
//!
//! | Source | Trigger | Entry point |
//! |---|---|---|
//! | push | deposit/withdraw frame on the user channel | [`TransactionManager::process_push_event`] |
//! | poll | a page of remote history | [`TransactionManager::reconcile`] |
//! | failsafe | local timer expiry | internal |
//!
//! ## State machine
//!
//! ```text
//! pending ──> confirmed
//!    └──────> failed
//! ```
//!
//! Every terminal transition goes through `resolve`, which only acts on a
//! pending record. Whichever source arrives first wins; the rest find the
//! record terminal and are dropped. Resolving aborts the record's timer, and
//! a timer that fired anyway is inert for the same reason.
//!
//! ## Persistence
//!
//! The whole list is rewritten under `transactions` on every change, newest
//! first. It is written while the list's watch lock is held so that
//! persisted and in-memory state cannot diverge.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use lib_utils::{elapsed_millis, now_millis};
use parking_lot::Mutex;
use shared::{HistoryEntry, TransactionStatus, TransactionUpdate};
use tokio::sync::{broadcast, watch};
use tokio::task::AbortHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::record::{NewTransaction, TransactionRecord};
use crate::services::push::{PushTransport, Subscription};
use crate::storage::{keys, load_json, save_json, DurableStore};

pub const TIMEOUT_ERROR: &str = "Transaction timed out waiting for confirmation";

/// Which source produced a terminal transition (for logs)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveSource {
    Push,
    History,
    Failsafe,
}

struct ManagerInner {
    store: Arc<dyn DurableStore>,
    failsafe: Duration,
    records: watch::Sender<Vec<TransactionRecord>>,
    timers: Mutex<HashMap<String, AbortHandle>>,
    initialized: AtomicBool,
    resolved: broadcast::Sender<TransactionRecord>,
    subscriptions: Mutex<Vec<Subscription>>,
}

/// Shared handle; clones operate on the same list.
#[derive(Clone)]
pub struct TransactionManager {
    inner: Arc<ManagerInner>,
}

impl TransactionManager {
    pub fn new(store: Arc<dyn DurableStore>, failsafe: Duration) -> Self {
        let (records, _) = watch::channel(Vec::new());
        let (resolved, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(ManagerInner {
                store,
                failsafe,
                records,
                timers: Mutex::new(HashMap::new()),
                initialized: AtomicBool::new(false),
                resolved,
                subscriptions: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Newest first
    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.inner.records.borrow().clone()
    }

    pub fn get(&self, id: &str) -> Option<TransactionRecord> {
        self.inner.records.borrow().iter().find(|r| r.id == id).cloned()
    }

    pub fn pending(&self) -> Vec<TransactionRecord> {
        self.inner
            .records
            .borrow()
            .iter()
            .filter(|r| r.is_pending())
            .cloned()
            .collect()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<TransactionRecord>> {
        self.inner.records.subscribe()
    }

    /// Stream of records as they reach a terminal status
    pub fn subscribe_resolved(&self) -> broadcast::Receiver<TransactionRecord> {
        self.inner.resolved.subscribe()
    }

    pub fn active_timers(&self) -> usize {
        self.inner.timers.lock().len()
    }

    /// Track a newly submitted transaction as pending and arm its failsafe.
    pub fn add_transaction(&self, new: NewTransaction) -> TransactionRecord {
        let record = TransactionRecord {
            id: Uuid::new_v4().to_string(),
            hash: new.hash,
            tx_type: new.tx_type,
            amount: new.amount,
            token_symbol: new.token_symbol,
            network: new.network,
            status: TransactionStatus::Pending,
            error: None,
            created_at: now_millis(),
            from_token: new.from_token,
            to_token: new.to_token,
        };

        self.inner.records.send_modify(|list| {
            list.insert(0, record.clone());
            self.inner.persist(list);
        });
        self.inner.arm_timer(&record.id, self.inner.failsafe);

        info!(
            id = %record.id,
            hash = %record.hash,
            tx_type = record.tx_type.as_str(),
            amount = %record.amount,
            "Transaction added"
        );
        record
    }

    /// Apply a push status update. Returns `true` if a record was resolved.
    ///
    /// Non-terminal updates, unknown hashes and records that already settled
    /// are dropped.
    pub fn process_push_event(&self, update: &TransactionUpdate) -> bool {
        if !update.status.is_terminal() {
            debug!(hash = %update.tx_hash, status = update.status.as_str(), "Ignoring non-terminal push update");
            return false;
        }

        self.inner
            .resolve(
                |r| r.matches(&update.tx_hash, update.id.as_deref()),
                update.status,
                update.error.clone(),
                ResolveSource::Push,
            )
            .is_some()
    }

    /// Load persisted records and re-arm failsafes for those still pending.
    ///
    /// Runs once per manager; later calls are no-ops. A pending record gets
    /// whatever is left of its window, measured from `created_at`; one whose
    /// window already elapsed is failed on the spot.
    pub fn initialize_transactions(&self) {
        if self.inner.initialized.swap(true, Ordering::AcqRel) {
            debug!("Transactions already initialized");
            return;
        }

        let stored: Vec<TransactionRecord> = load_json(self.inner.store.as_ref(), keys::TRANSACTIONS).unwrap_or_default();
        let mut loaded = Vec::new();
        self.inner.records.send_modify(|list| {
            for record in stored {
                if !list.iter().any(|r| r.id == record.id) {
                    loaded.push(record.clone());
                    list.push(record);
                }
            }
            self.inner.persist(list);
        });

        let window = self.inner.failsafe.as_millis() as u64;
        let mut rearmed = 0usize;
        let mut expired = 0usize;
        for record in loaded.iter().filter(|r| r.is_pending()) {
            let elapsed = elapsed_millis(record.created_at);
            if elapsed < window {
                self.inner.arm_timer(&record.id, Duration::from_millis(window - elapsed));
                rearmed += 1;
            } else {
                self.inner.resolve(
                    |r| r.id == record.id,
                    TransactionStatus::Failed,
                    Some(TIMEOUT_ERROR.to_string()),
                    ResolveSource::Failsafe,
                );
                expired += 1;
            }
        }

        info!(loaded = loaded.len(), rearmed, expired, "Transactions initialized");
    }

    /// Resolve pending records that remote history already reports as settled.
    /// Returns how many were resolved.
    pub fn reconcile(&self, history: &[HistoryEntry]) -> usize {
        let resolved = history
            .iter()
            .filter(|entry| entry.status.is_terminal())
            .filter(|entry| {
                self.inner
                    .resolve(
                        |r| r.matches(&entry.tx_hash, None),
                        entry.status,
                        entry.error.clone(),
                        ResolveSource::History,
                    )
                    .is_some()
            })
            .count();

        if resolved > 0 {
            info!(resolved, "Reconciled transactions with remote history");
        }
        resolved
    }

    /// Cancel every timer and forget every record, in memory and on disk.
    pub fn clear_transactions(&self) {
        let cancelled = self.inner.cancel_timers();
        self.inner.records.send_modify(|list| {
            list.clear();
            if let Err(e) = self.inner.store.remove(keys::TRANSACTIONS) {
                warn!(error = %e, "Failed to remove persisted transactions");
            }
        });
        info!(cancelled_timers = cancelled, "Transactions cleared");
    }

    /// Route deposit and withdraw push updates into this manager.
    ///
    /// Replaces any previous attachment.
    pub fn attach_push(&self, transport: &PushTransport) {
        let deposits = Arc::downgrade(&self.inner);
        let withdraws = Arc::downgrade(&self.inner);
        let subscriptions = vec![
            transport.subscribe_to_deposits(move |update| forward(&deposits, update)),
            transport.subscribe_to_withdraws(move |update| forward(&withdraws, update)),
        ];
        *self.inner.subscriptions.lock() = subscriptions;
    }

    /// Cancel timers and release push subscriptions. Records are kept.
    pub fn shutdown(&self) {
        let cancelled = self.inner.cancel_timers();
        let released = std::mem::take(&mut *self.inner.subscriptions.lock());
        debug!(cancelled_timers = cancelled, subscriptions = released.len(), "Transaction manager shut down");
    }
}

fn forward(inner: &Weak<ManagerInner>, update: &TransactionUpdate) {
    if let Some(inner) = inner.upgrade() {
        TransactionManager { inner }.process_push_event(update);
    }
}

impl ManagerInner {
    fn persist(&self, list: &[TransactionRecord]) {
        if let Err(e) = save_json(self.store.as_ref(), keys::TRANSACTIONS, list) {
            warn!(error = %e, "Failed to persist transactions");
        }
    }

    fn arm_timer(self: &Arc<Self>, id: &str, delay: Duration) {
        let inner = Arc::downgrade(self);
        let timer_id = id.to_string();
        let task = tokio::spawn(async move {
            sleep(delay).await;
            if let Some(inner) = inner.upgrade() {
                inner.timers.lock().remove(&timer_id);
                inner.resolve(
                    |r| r.id == timer_id,
                    TransactionStatus::Failed,
                    Some(TIMEOUT_ERROR.to_string()),
                    ResolveSource::Failsafe,
                );
            }
        });

        if let Some(previous) = self.timers.lock().insert(id.to_string(), task.abort_handle()) {
            previous.abort();
        }
        debug!(id = %id, delay_ms = delay.as_millis(), "Failsafe timer armed");
    }

    fn cancel_timers(&self) -> usize {
        let timers: Vec<AbortHandle> = self.timers.lock().drain().map(|(_, t)| t).collect();
        for timer in &timers {
            timer.abort();
        }
        timers.len()
    }

    /// The one place a record leaves `pending`.
    fn resolve(
        &self,
        matches: impl Fn(&TransactionRecord) -> bool,
        status: TransactionStatus,
        error: Option<String>,
        source: ResolveSource,
    ) -> Option<TransactionRecord> {
        if !status.is_terminal() {
            return None;
        }

        let mut resolved = None;
        self.records.send_if_modified(|list| {
            let Some(record) = list.iter_mut().find(|r| matches(r)) else {
                return false;
            };
            if !record.is_pending() {
                debug!(
                    id = %record.id,
                    status = record.status.as_str(),
                    ?source,
                    "Record already settled, dropping update"
                );
                return false;
            }

            record.status = status;
            record.error = match status {
                TransactionStatus::Failed => error.or_else(|| Some("Transaction failed".to_string())),
                _ => None,
            };
            resolved = Some(record.clone());
            self.persist(list);
            true
        });

        let record = resolved?;
        if let Some(timer) = self.timers.lock().remove(&record.id) {
            timer.abort();
        }
        info!(
            id = %record.id,
            hash = %record.hash,
            status = record.status.as_str(),
            ?source,
            "Transaction resolved"
        );
        let _ = self.resolved.send(record.clone());
        Some(record)
    }
}
