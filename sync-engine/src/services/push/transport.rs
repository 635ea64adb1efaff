//! # Push Transport Adapter
//!
//! Owns at most one connection, for the logged-in user, on channel
//! `user-{username}`.
//!
//! ## Connection lifecycle
//!
//! ```text
//! connect(user) ──> Connecting ──ok──> Connected ──dropped──> Reconnecting ─┐
//!                       │                  ^                                │
//!                       └──failed──> Reconnecting ─────────────ok──────────┘
//!                                          │
//!                          attempts >= max └──> Disabled
//! ```
//!
//! Backoff starts at 1s and doubles up to 60s; a successful connection resets
//! both the delay and the attempt counter. `disconnect()` aborts the reader
//! task; a later `connect()` starts a fresh connection with no replay.
//!
//! ## Subscribers
//!
//! Callbacks are kept per [`PushChannel`] and invoked in registration order,
//! outside of any lock. The [`Subscription`] guard removes its callback when
//! dropped or when [`Subscription::unsubscribe`] is called.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use lib_utils::now_millis;
use parking_lot::Mutex;
use shared::{short_hash, PushEvent, PushFrameError, TransactionUpdate};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, trace, warn};

use super::status::{PushState, PushStatus};
use super::PushConnector;

const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

pub type PushCallback = Arc<dyn Fn(&TransactionUpdate) + Send + Sync>;

/// Event channel a subscriber listens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushChannel {
    Deposit,
    Withdraw,
}

/// Channel key for a user's private push channel
pub fn user_channel(username: &str) -> String {
    format!("user-{}", username)
}

struct Subscriber {
    id: u64,
    callback: PushCallback,
}

struct Connection {
    username: String,
    task: AbortHandle,
}

struct TransportInner {
    connector: Arc<dyn PushConnector>,
    max_attempts: u64,
    subscribers: Mutex<HashMap<PushChannel, Vec<Subscriber>>>,
    next_subscriber: AtomicU64,
    connection: Mutex<Option<Connection>>,
    /// Bumped on every connect/disconnect; a reader task from an older
    /// generation may neither publish status nor dispatch events
    generation: AtomicU64,
    status: watch::Sender<PushStatus>,
}

/// Push transport shared by the session layer and the transaction manager.
#[derive(Clone)]
pub struct PushTransport {
    inner: Arc<TransportInner>,
}

impl PushTransport {
    pub fn new(connector: Arc<dyn PushConnector>, max_attempts: u64) -> Self {
        let (status, _) = watch::channel(PushStatus::default());
        Self {
            inner: Arc::new(TransportInner {
                connector,
                max_attempts: max_attempts.max(1),
                subscribers: Mutex::new(HashMap::new()),
                next_subscriber: AtomicU64::new(0),
                connection: Mutex::new(None),
                generation: AtomicU64::new(0),
                status,
            }),
        }
    }

    /// Open the channel for `username`.
    ///
    /// No-op when a live connection for the same user exists; a different
    /// user's connection is torn down first.
    pub fn connect(&self, username: &str) {
        let mut connection = self.inner.connection.lock();

        if let Some(current) = connection.as_ref() {
            if current.username == username && !current.task.is_finished() {
                debug!(user = %username, "Push already connected for user");
                return;
            }
        }
        if let Some(previous) = connection.take() {
            info!(previous = %previous.username, next = %username, "Replacing push connection");
            previous.task.abort();
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.inner.status.send_replace(PushStatus {
            state: PushState::Connecting,
            ..PushStatus::default()
        });

        let inner = Arc::clone(&self.inner);
        let channel = user_channel(username);
        let task = tokio::spawn(async move { inner.run(channel, generation).await });

        *connection = Some(Connection {
            username: username.to_string(),
            task: task.abort_handle(),
        });
    }

    /// Close the connection, if any. Subscribers stay registered.
    pub fn disconnect(&self) {
        let mut connection = self.inner.connection.lock();
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(previous) = connection.take() {
            previous.task.abort();
            info!(user = %previous.username, "Push disconnected");
        }
        self.inner.status.send_replace(PushStatus::default());
    }

    /// User the transport is connected (or connecting) for
    pub fn connected_user(&self) -> Option<String> {
        self.inner.connection.lock().as_ref().map(|c| c.username.clone())
    }

    pub fn subscribe_to_deposits(&self, callback: impl Fn(&TransactionUpdate) + Send + Sync + 'static) -> Subscription {
        self.subscribe(PushChannel::Deposit, Arc::new(callback))
    }

    pub fn subscribe_to_withdraws(&self, callback: impl Fn(&TransactionUpdate) + Send + Sync + 'static) -> Subscription {
        self.subscribe(PushChannel::Withdraw, Arc::new(callback))
    }

    pub fn subscribe(&self, channel: PushChannel, callback: PushCallback) -> Subscription {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .lock()
            .entry(channel)
            .or_default()
            .push(Subscriber { id, callback });
        debug!(?channel, id, "Push subscriber added");

        Subscription {
            transport: Arc::downgrade(&self.inner),
            channel,
            id,
        }
    }

    pub fn subscriber_count(&self, channel: PushChannel) -> usize {
        self.inner.subscribers.lock().get(&channel).map_or(0, Vec::len)
    }

    pub fn status(&self) -> PushStatus {
        self.inner.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PushStatus> {
        self.inner.status.subscribe()
    }
}

impl TransportInner {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    fn update_status(&self, generation: u64, update: impl FnOnce(&mut PushStatus)) {
        self.status.send_if_modified(|status| {
            if !self.is_current(generation) {
                return false;
            }
            update(status);
            true
        });
    }

    /// Connect, read until the connection drops, back off, repeat.
    async fn run(self: Arc<Self>, channel: String, generation: u64) {
        let mut delay = INITIAL_RECONNECT_DELAY;
        let mut attempts = 0u64;
        let mut reconnecting = false;

        loop {
            attempts += 1;
            self.update_status(generation, |status| {
                status.state = if reconnecting { PushState::Reconnecting } else { PushState::Connecting };
                status.connection_attempts = attempts;
            });

            match self.connector.connect(&channel).await {
                Ok(mut socket) => {
                    info!(channel = %channel, attempt = attempts, "Push channel connected");
                    delay = INITIAL_RECONNECT_DELAY;
                    attempts = 0;
                    self.update_status(generation, |status| {
                        status.state = PushState::Connected;
                        status.connection_attempts = 0;
                        status.last_connected = Some(now_millis());
                        status.last_error = None;
                    });

                    while let Some(frame) = socket.next_frame().await {
                        match frame {
                            Ok(text) => self.dispatch(generation, &text),
                            Err(e) => {
                                error!(channel = %channel, error = %e, "Push read error");
                                self.update_status(generation, |status| {
                                    status.last_error = Some(e.to_string());
                                });
                                break;
                            }
                        }
                    }
                    warn!(channel = %channel, "Push connection lost, reconnecting");
                }
                Err(e) => {
                    error!(
                        channel = %channel,
                        error = %e,
                        attempt = attempts,
                        max_attempts = self.max_attempts,
                        "Failed to connect push channel"
                    );
                    self.update_status(generation, |status| {
                        status.last_error = Some(e.to_string());
                    });

                    if attempts >= self.max_attempts {
                        error!(
                            channel = %channel,
                            attempts,
                            "Maximum push connection attempts reached, disabling push"
                        );
                        self.update_status(generation, |status| status.state = PushState::Disabled);
                        return;
                    }
                }
            }

            reconnecting = true;
            self.update_status(generation, |status| status.state = PushState::Reconnecting);
            info!(delay_secs = delay.as_secs(), "Reconnecting push channel");
            sleep(delay).await;
            delay = (delay * 2).min(MAX_RECONNECT_DELAY);
        }
    }

    fn dispatch(&self, generation: u64, text: &str) {
        if !self.is_current(generation) {
            return;
        }

        match PushEvent::parse(text) {
            Ok(PushEvent::Deposit(update)) => self.notify(PushChannel::Deposit, &update),
            Ok(PushEvent::Withdraw(update)) => self.notify(PushChannel::Withdraw, &update),
            Ok(PushEvent::Chat(_)) => trace!("Ignoring chat push frame"),
            Err(PushFrameError::UnknownType(kind)) => debug!(kind = %kind, "Ignoring unknown push event type"),
            Err(e) => warn!(error = %e, "Dropping invalid push frame"),
        }

        self.update_status(generation, |status| {
            status.messages_received += 1;
            status.last_message = Some(now_millis());
        });
    }

    fn notify(&self, channel: PushChannel, update: &TransactionUpdate) {
        let callbacks: Vec<PushCallback> = self
            .subscribers
            .lock()
            .get(&channel)
            .map(|subs| subs.iter().map(|s| Arc::clone(&s.callback)).collect())
            .unwrap_or_default();

        debug!(
            ?channel,
            tx_hash = %short_hash(&update.tx_hash),
            status = update.status.as_str(),
            subscribers = callbacks.len(),
            "Dispatching push update"
        );
        for callback in callbacks {
            callback(update);
        }
    }

    fn remove_subscriber(&self, channel: PushChannel, id: u64) {
        if let Some(subs) = self.subscribers.lock().get_mut(&channel) {
            subs.retain(|s| s.id != id);
        }
    }
}

/// Registration handle; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    transport: Weak<TransportInner>,
    channel: PushChannel,
    id: u64,
}

impl Subscription {
    pub fn channel(&self) -> PushChannel {
        self.channel
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(transport) = self.transport.upgrade() {
            transport.remove_subscriber(self.channel, self.id);
            debug!(channel = ?self.channel, id = self.id, "Push subscriber removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockPushConnector;
    use shared::TransactionStatus;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::mpsc;

    const DEPOSIT: &str = r#"{"type":"deposit","data":{"txHash":"0xd1","status":"confirmed"}}"#;
    const WITHDRAW: &str = r#"{"type":"withdraw","data":{"txHash":"0xw1","status":"failed","error":"reverted"}}"#;

    fn transport(max_attempts: u64) -> (PushTransport, Arc<MockPushConnector>) {
        let connector = MockPushConnector::new();
        (PushTransport::new(connector.clone(), max_attempts), connector)
    }

    async fn wait_connected(transport: &PushTransport) {
        transport
            .subscribe_status()
            .wait_for(|s| s.state == PushState::Connected)
            .await
            .unwrap();
    }

    async fn wait_messages(transport: &PushTransport, count: u64) {
        transport
            .subscribe_status()
            .wait_for(|s| s.messages_received >= count)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_connects_to_user_channel_and_routes_updates() {
        let (transport, connector) = transport(5);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let deposits_tx = tx.clone();
        let _deposits = transport.subscribe_to_deposits(move |u| {
            let _ = deposits_tx.send(("deposit", u.clone()));
        });
        let _withdraws = transport.subscribe_to_withdraws(move |u| {
            let _ = tx.send(("withdraw", u.clone()));
        });

        transport.connect("alice");
        wait_connected(&transport).await;
        assert_eq!(connector.channels.lock().as_slice(), ["user-alice".to_string()]);

        assert!(connector.push(WITHDRAW));
        let (channel, update) = rx.recv().await.unwrap();
        assert_eq!(channel, "withdraw");
        assert_eq!(update.tx_hash, "0xw1");
        assert_eq!(update.status, TransactionStatus::Failed);

        assert!(connector.push(DEPOSIT));
        let (channel, update) = rx.recv().await.unwrap();
        assert_eq!(channel, "deposit");
        assert_eq!(update.tx_hash, "0xd1");
    }

    #[tokio::test]
    async fn test_subscribers_run_in_registration_order() {
        let (transport, connector) = transport(5);
        let order = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<Subscription> = (0..3)
            .map(|i| {
                let order = order.clone();
                transport.subscribe_to_deposits(move |_| order.lock().push(i))
            })
            .collect();

        transport.connect("alice");
        wait_connected(&transport).await;
        connector.push(DEPOSIT);
        wait_messages(&transport, 1).await;

        assert_eq!(*order.lock(), vec![0, 1, 2]);
        drop(subs);
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_callback() {
        let (transport, connector) = transport(5);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let sub = transport.subscribe_to_deposits(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let dropped = {
            let counter = calls.clone();
            transport.subscribe_to_deposits(move |_| {
                counter.fetch_add(100, Ordering::SeqCst);
            })
        };
        drop(dropped);
        assert_eq!(transport.subscriber_count(PushChannel::Deposit), 1);

        transport.connect("alice");
        wait_connected(&transport).await;
        connector.push(DEPOSIT);
        wait_messages(&transport, 1).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        sub.unsubscribe();
        assert_eq!(transport.subscriber_count(PushChannel::Deposit), 0);
        connector.push(DEPOSIT);
        wait_messages(&transport, 2).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_frames_are_ignored() {
        let (transport, connector) = transport(5);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = transport.subscribe_to_deposits(move |u| sink.lock().push(u.tx_hash.clone()));

        transport.connect("alice");
        wait_connected(&transport).await;
        connector.push(r#"{"type":"jackpot","data":{"amount":"1000"}}"#);
        connector.push(r#"{"type":"chat","data":{"text":"gl"}}"#);
        connector.push("not json");
        connector.push(r#"{"type":"deposit","data":{"status":"confirmed"}}"#);
        connector.push(DEPOSIT);
        wait_messages(&transport, 5).await;

        assert_eq!(*seen.lock(), vec!["0xd1".to_string()]);
        assert!(transport.status().is_connected());
    }

    #[tokio::test]
    async fn test_connect_is_idempotent_per_user() {
        let (transport, connector) = transport(5);

        transport.connect("alice");
        wait_connected(&transport).await;
        transport.connect("alice");
        tokio::task::yield_now().await;
        assert_eq!(connector.connections(), 1);

        transport.connect("bob");
        wait_connected(&transport).await;
        assert_eq!(connector.channels.lock().last().map(String::as_str), Some("user-bob"));
        assert_eq!(transport.connected_user().as_deref(), Some("bob"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_then_disabled() {
        let (transport, connector) = transport(3);
        connector.refuse.store(10, Ordering::SeqCst);
        let started = tokio::time::Instant::now();

        transport.connect("alice");
        let status = transport
            .subscribe_status()
            .wait_for(|s| s.state == PushState::Disabled)
            .await
            .unwrap()
            .clone();

        assert_eq!(status.connection_attempts, 3);
        assert_eq!(status.last_error.as_deref(), Some("Transport error: connection refused"));
        // 1s + 2s of backoff between three attempts
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(connector.channels.lock().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_connection_drop() {
        let (transport, connector) = transport(5);
        transport.connect("alice");
        wait_connected(&transport).await;

        connector.drop_connection();
        transport
            .subscribe_status()
            .wait_for(|s| s.state == PushState::Reconnecting)
            .await
            .unwrap();
        wait_connected(&transport).await;

        assert_eq!(connector.channels.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_disconnect_stops_delivery() {
        let (transport, connector) = transport(5);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let _sub = transport.subscribe_to_deposits(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        transport.connect("alice");
        wait_connected(&transport).await;
        transport.disconnect();

        assert_eq!(transport.status(), PushStatus::default());
        assert!(transport.connected_user().is_none());
        connector.push(DEPOSIT);
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
