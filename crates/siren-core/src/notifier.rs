// ── Notification lifecycle manager ──
//
// Owns the registry and runs the single-writer event loop that applies
// inbound alarm pushes and user-initiated terminal actions. Outbound
// HTTP calls and close-delay timers run in spawned tasks that message
// their completion back into the loop, so nothing blocks it and entries
// for different keys proceed independently.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use siren_api::{AlarmClient, AlarmEvent, EventStreamHandle, TlsMode, TransportConfig};

use crate::config::NotifierConfig;
use crate::error::CoreError;
use crate::model::{
    NotificationChange, NotificationEntry, NotificationKey, NotificationState, TerminalAction,
};
use crate::registry::NotificationRegistry;
use crate::stream::NotificationStream;

const MSG_CHANNEL_SIZE: usize = 256;
const CHANGE_CHANNEL_SIZE: usize = 256;

// ── Loop messages ────────────────────────────────────────────────────

/// Everything the event loop reacts to. Inbound pushes, terminal-action
/// requests, and the completions spawned tasks send back all arrive on
/// one channel, making the loop the registry's only writer.
enum Msg {
    /// An alarm push from the stream (or an explicit `ingest` call).
    Event(Arc<AlarmEvent>),

    /// User-initiated acknowledge/ignore.
    Action {
        action: TerminalAction,
        alarm_id: String,
        reply: oneshot::Sender<Result<(), CoreError>>,
    },

    /// The outbound confirmation call finished.
    ActionDone {
        key: NotificationKey,
        alarm_id: String,
        action: TerminalAction,
        result: Result<(), siren_api::Error>,
        reply: oneshot::Sender<Result<(), CoreError>>,
    },

    /// The post-success feedback window elapsed; close the entry.
    CloseElapsed {
        key: NotificationKey,
        alarm_id: String,
    },
}

// ── Notifier ─────────────────────────────────────────────────────────

/// The alarm notification lifecycle manager.
///
/// Guarantees a 1:1 correspondence between (device, alarm-type) and live
/// notification, with explicit human-confirmed closure only: repeated
/// pushes for one key coalesce into in-place updates, no timer ever
/// closes an entry, and an entry leaves the registry only through a
/// successful [`acknowledge`](Self::acknowledge) or
/// [`ignore`](Self::ignore).
///
/// Cheaply cloneable via `Arc` internals. Construct with
/// [`new`](Self::new), then [`connect`](Self::connect) to start the
/// event loop (and the SSE subscription, unless disabled).
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

struct NotifierInner {
    config: NotifierConfig,
    transport: TransportConfig,
    registry: Arc<NotificationRegistry>,
    client: AlarmClient,
    change_tx: broadcast::Sender<NotificationChange>,
    msg_tx: mpsc::Sender<Msg>,
    /// Taken by the event loop on connect.
    msg_rx: Mutex<Option<mpsc::Receiver<Msg>>>,
    cancel: CancellationToken,
    stream_handle: Mutex<Option<EventStreamHandle>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Notifier {
    /// Create a manager from configuration. Does NOT start anything --
    /// call [`connect`](Self::connect).
    pub fn new(config: NotifierConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: if config.insecure {
                TlsMode::DangerAcceptInvalid
            } else {
                TlsMode::System
            },
            timeout: config.timeout,
        };
        let client = AlarmClient::new(config.url.clone(), &transport)?;

        let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_SIZE);
        let (msg_tx, msg_rx) = mpsc::channel(MSG_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(NotifierInner {
                config,
                transport,
                registry: Arc::new(NotificationRegistry::new()),
                client,
                change_tx,
                msg_tx,
                msg_rx: Mutex::new(Some(msg_rx)),
                cancel: CancellationToken::new(),
                stream_handle: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Access the manager configuration.
    pub fn config(&self) -> &NotifierConfig {
        &self.inner.config
    }

    /// The REST client this manager uses (for ad-hoc reads like alarm
    /// listings alongside the live lifecycle).
    pub fn client(&self) -> &AlarmClient {
        &self.inner.client
    }

    /// Read access to the live registry.
    pub fn registry(&self) -> &NotificationRegistry {
        &self.inner.registry
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the event loop and, unless disabled, the SSE subscription.
    ///
    /// Idempotent: a second call on a running manager is a no-op.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let Some(msg_rx) = self.inner.msg_rx.lock().await.take() else {
            return Ok(());
        };

        let event_loop = EventLoop {
            registry: Arc::clone(&self.inner.registry),
            client: self.inner.client.clone(),
            change_tx: self.inner.change_tx.clone(),
            loopback_tx: self.inner.msg_tx.clone(),
            close_delay: self.inner.config.close_delay,
            cancel: self.inner.cancel.clone(),
        };
        // Track the loop task before the stream connect below; if that
        // fails, shutdown() can still stop and await the loop.
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(event_loop.run(msg_rx)));

        if self.inner.config.stream_enabled {
            let handle = EventStreamHandle::connect(
                self.inner.client.stream_url(),
                self.inner.config.reconnect.clone(),
                self.inner.cancel.child_token(),
                &self.inner.transport,
            )?;

            // Forward stream events into the loop. A lagged receiver just
            // skips ahead; the backend re-pushes state as repeat events.
            let mut stream_rx = handle.subscribe();
            let msg_tx = self.inner.msg_tx.clone();
            let cancel = self.inner.cancel.clone();
            let forwarder = tokio::spawn(async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        received = stream_rx.recv() => match received {
                            Ok(event) => {
                                if msg_tx.send(Msg::Event(event)).await.is_err() {
                                    break;
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                warn!(skipped, "notification consumer lagged behind stream");
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            });
            self.inner.task_handles.lock().await.push(forwarder);

            *self.inner.stream_handle.lock().await = Some(handle);
            info!(url = %self.inner.config.url, "notification stream subscription started");
        }

        Ok(())
    }

    /// Stop the event loop and stream, then wait for tasks to finish.
    ///
    /// The registry is simply discarded; it is rebuilt from new events
    /// on the next start.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        if let Some(handle) = self.inner.stream_handle.lock().await.take() {
            handle.shutdown();
        }

        for handle in self.inner.task_handles.lock().await.drain(..) {
            let _ = handle.await;
        }
        debug!("notification manager stopped");
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Feed one alarm event into the lifecycle.
    ///
    /// The SSE subscription calls this path automatically; it is public
    /// for poll-based frontends and tests. Events for the same key are
    /// applied strictly in submission order.
    pub async fn ingest(&self, event: AlarmEvent) -> Result<(), CoreError> {
        self.inner
            .msg_tx
            .send(Msg::Event(Arc::new(event)))
            .await
            .map_err(|_| CoreError::NotRunning)
    }

    /// Acknowledge an alarm: confirm it was handled, then close its
    /// notification after the feedback window.
    ///
    /// Resolves once the backend call completes. On failure the entry is
    /// rolled back to its interactive state and the error returned;
    /// retrying is safe.
    pub async fn acknowledge(&self, alarm_id: &str) -> Result<(), CoreError> {
        self.execute(TerminalAction::Acknowledge, alarm_id).await
    }

    /// Ignore an alarm: clear it on the backend, then close its
    /// notification after the feedback window.
    pub async fn ignore(&self, alarm_id: &str) -> Result<(), CoreError> {
        self.execute(TerminalAction::Ignore, alarm_id).await
    }

    async fn execute(&self, action: TerminalAction, alarm_id: &str) -> Result<(), CoreError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inner
            .msg_tx
            .send(Msg::Action {
                action,
                alarm_id: alarm_id.to_owned(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| CoreError::NotRunning)?;

        reply_rx.await.map_err(|_| CoreError::NotRunning)?
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Subscribe to lifecycle changes -- the feed a pure renderer draws
    /// from.
    pub fn changes(&self) -> broadcast::Receiver<NotificationChange> {
        self.inner.change_tx.subscribe()
    }

    /// Current snapshot of all live notifications.
    pub fn notifications(&self) -> Arc<Vec<Arc<NotificationEntry>>> {
        self.inner.registry.snapshot()
    }

    /// Reactive subscription to registry snapshots.
    pub fn subscribe(&self) -> NotificationStream {
        NotificationStream::new(self.inner.registry.subscribe())
    }
}

// ── Event loop ───────────────────────────────────────────────────────

/// The registry's single writer.
struct EventLoop {
    registry: Arc<NotificationRegistry>,
    client: AlarmClient,
    change_tx: broadcast::Sender<NotificationChange>,
    /// Handle back into our own channel, for spawned completions.
    loopback_tx: mpsc::Sender<Msg>,
    close_delay: Duration,
    cancel: CancellationToken,
}

impl EventLoop {
    async fn run(self, mut rx: mpsc::Receiver<Msg>) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                msg = rx.recv() => match msg {
                    Some(Msg::Event(event)) => self.apply_event(&event),
                    Some(Msg::Action { action, alarm_id, reply }) => {
                        self.start_action(action, alarm_id, reply);
                    }
                    Some(Msg::ActionDone { key, alarm_id, action, result, reply }) => {
                        self.finish_action(key, alarm_id, action, result, reply);
                    }
                    Some(Msg::CloseElapsed { key, alarm_id }) => {
                        self.close_entry(&key, &alarm_id);
                    }
                    None => break,
                }
            }
        }
        debug!("notification event loop exiting");
    }

    /// Ingest one alarm push: open a new entry, or coalesce into the
    /// existing one for its key. Never removes, never changes lifecycle
    /// state.
    fn apply_event(&self, event: &AlarmEvent) {
        let key = NotificationKey::for_event(event);

        if let Some(existing) = self.registry.get(&key) {
            let updated = existing.coalesce(event);
            self.registry.upsert(updated.clone());
            debug!(
                key = %key,
                action = %event.action,
                count = event.notification_count,
                "coalesced alarm push into existing notification"
            );
            self.emit(NotificationChange::Updated(Arc::new(updated)));
        } else {
            let entry = NotificationEntry::open(key.clone(), event);
            self.registry.upsert(entry.clone());
            info!(key = %key, severity = %event.severity, "opened notification");
            self.emit(NotificationChange::Opened(Arc::new(entry)));
        }
    }

    /// Begin a terminal action: flip the entry to `Resolving` and spawn
    /// the outbound call. The `Resolving` guard rejects a second action
    /// on the same entry while one is in flight.
    fn start_action(
        &self,
        action: TerminalAction,
        alarm_id: String,
        reply: oneshot::Sender<Result<(), CoreError>>,
    ) {
        let Some(entry) = self.registry.get_by_alarm_id(&alarm_id) else {
            let _ = reply.send(Err(CoreError::UnknownAlarm { alarm_id }));
            return;
        };

        if entry.state != NotificationState::Visible {
            let _ = reply.send(Err(CoreError::ActionInFlight { alarm_id }));
            return;
        }

        self.registry
            .upsert(entry.with_state(NotificationState::Resolving));
        self.emit(NotificationChange::Resolving {
            key: entry.key.clone(),
            action,
        });

        let client = self.client.clone();
        let loopback = self.loopback_tx.clone();
        let key = entry.key.clone();
        tokio::spawn(async move {
            let result = match action {
                TerminalAction::Acknowledge => client.acknowledge(&alarm_id).await.map(|_| ()),
                TerminalAction::Ignore => client.clear_alarm(&alarm_id).await.map(|_| ()),
            };
            // If the loop is gone the reply sender drops with this message,
            // which callers observe as NotRunning.
            let _ = loopback
                .send(Msg::ActionDone {
                    key,
                    alarm_id,
                    action,
                    result,
                    reply,
                })
                .await;
        });
    }

    /// Apply an outbound call's result: schedule the close on success,
    /// roll back to `Visible` on failure.
    fn finish_action(
        &self,
        key: NotificationKey,
        alarm_id: String,
        action: TerminalAction,
        result: Result<(), siren_api::Error>,
        reply: oneshot::Sender<Result<(), CoreError>>,
    ) {
        match result {
            Ok(()) => {
                info!(key = %key, %action, "terminal action confirmed");
                self.emit(NotificationChange::Resolved {
                    key: key.clone(),
                    action,
                });

                let loopback = self.loopback_tx.clone();
                let delay = self.close_delay;
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {}
                        _ = tokio::time::sleep(delay) => {
                            let _ = loopback.send(Msg::CloseElapsed { key, alarm_id }).await;
                        }
                    }
                });

                let _ = reply.send(Ok(()));
            }
            Err(e) => {
                if let Some(entry) = self.registry.get(&key) {
                    if entry.state == NotificationState::Resolving {
                        self.registry
                            .upsert(entry.with_state(NotificationState::Visible));
                    }
                }
                warn!(key = %key, %action, error = %e, "terminal action failed, rolling back");
                self.emit(NotificationChange::ActionFailed {
                    key,
                    action,
                    message: e.to_string(),
                });
                let _ = reply.send(Err(CoreError::ActionFailed {
                    action,
                    alarm_id,
                    source: e,
                }));
            }
        }
    }

    /// Terminal transition: remove the entry and free its key.
    fn close_entry(&self, key: &NotificationKey, alarm_id: &str) {
        let Some(entry) = self.registry.get(key) else {
            return;
        };

        if entry.alarm_id != alarm_id {
            // The slot was re-keyed to a newer alarm while the feedback
            // window ran. That alarm was never actioned -- make it
            // interactive instead of closing it.
            let revived = entry.with_state(NotificationState::Visible);
            self.registry.upsert(revived.clone());
            self.emit(NotificationChange::Updated(Arc::new(revived)));
            return;
        }

        if entry.state != NotificationState::Resolving {
            return;
        }

        self.registry.remove(key);
        info!(key = %key, "notification closed");
        self.emit(NotificationChange::Closed { key: key.clone() });
    }

    fn emit(&self, change: NotificationChange) {
        // Ignore send errors -- just means no renderer is subscribed.
        let _ = self.change_tx.send(change);
    }
}
