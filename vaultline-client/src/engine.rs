//! Composition root and run loop for the synchronization engine.
//!
//! Control flow: startup paints from cache and reconciles in the
//! background, the stream manager feeds typed events into the loop, every
//! trigger source debounces into a targeted forced re-fetch, and a
//! periodic tick reconciles cache-first. Teardown drops the debounce
//! timers and flags the fetcher so late responses are discarded.

use crate::actions::ActionDispatcher;
use crate::api_client::ConsentApi;
use crate::cache::CacheStore;
use crate::config::ClientConfig;
use crate::debounce::Debouncer;
use crate::dispatch::{self, RefreshSet, TriggerSource};
use crate::events::ClientEvent;
use crate::fetch::Fetcher;
use crate::notifications::Notifier;
use crate::signals::{Signal, SignalBus};
use crate::state::DashboardState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use vaultline_core::{SessionInfo, UserId};

pub struct SyncEngine {
    state: Arc<Mutex<DashboardState>>,
    cache: Arc<CacheStore>,
    fetcher: Fetcher,
    actions: Arc<ActionDispatcher>,
    debouncer: Debouncer<TriggerSource, RefreshSet>,
    signals: SignalBus,
    signal_rx: broadcast::Receiver<Signal>,
    events_tx: mpsc::Sender<ClientEvent>,
    events_rx: mpsc::Receiver<ClientEvent>,
    refresh_rx: mpsc::Receiver<(TriggerSource, RefreshSet)>,
    refresh_interval: Duration,
    closed: Arc<AtomicBool>,
}

impl SyncEngine {
    pub fn new(
        config: &ClientConfig,
        api: Arc<dyn ConsentApi>,
        session: SessionInfo,
        user_id: UserId,
        notifier: Arc<Notifier>,
        signals: SignalBus,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        let (refresh_tx, refresh_rx) = mpsc::channel(64);

        let debounce_config = config.debounce.clone();
        let debouncer = Debouncer::new(
            move |source: &TriggerSource| source.quiet_window(&debounce_config),
            refresh_tx,
        );

        let state = Arc::new(Mutex::new(DashboardState::new(session)));
        let cache = Arc::new(CacheStore::new());
        let closed = Arc::new(AtomicBool::new(false));
        let fetcher = Fetcher::new(
            api.clone(),
            cache.clone(),
            state.clone(),
            user_id,
            config.history_page_size,
            closed.clone(),
        );
        let actions = Arc::new(ActionDispatcher::new(
            api,
            state.clone(),
            notifier,
            signals.clone(),
        ));
        let signal_rx = signals.subscribe();

        Self {
            state,
            cache,
            fetcher,
            actions,
            debouncer,
            signals,
            signal_rx,
            events_tx,
            events_rx,
            refresh_rx,
            refresh_interval: Duration::from_millis(config.refresh_interval_ms),
            closed,
        }
    }

    pub fn state(&self) -> Arc<Mutex<DashboardState>> {
        self.state.clone()
    }

    pub fn cache(&self) -> Arc<CacheStore> {
        self.cache.clone()
    }

    pub fn actions(&self) -> Arc<ActionDispatcher> {
        self.actions.clone()
    }

    pub fn signals(&self) -> SignalBus {
        self.signals.clone()
    }

    /// Sender for the stream manager and any push-notification adapter.
    pub fn events_sender(&self) -> mpsc::Sender<ClientEvent> {
        self.events_tx.clone()
    }

    /// Initial paint: cache-first so a warm cache renders instantly, with
    /// the network reconciling whatever is missing.
    pub async fn start(&self) {
        self.fetcher.run(RefreshSet::ALL, false).await;
    }

    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.refresh_interval);
        // The first tick completes immediately; consume it so startup does
        // not double-fetch.
        ticker.tick().await;

        loop {
            tokio::select! {
                event = self.events_rx.recv() => {
                    let Some(event) = event else { break };
                    self.handle_event(event).await;
                }
                due = self.refresh_rx.recv() => {
                    let Some((source, set)) = due else { break };
                    debug!(?source, "debounce window settled; forcing refresh");
                    self.fetcher.run(set, true).await;
                }
                signal = self.signal_rx.recv() => {
                    if let Ok(signal) = signal {
                        self.handle_signal(signal);
                    }
                }
                _ = ticker.tick() => {
                    self.fetcher.run(RefreshSet::ALL, false).await;
                }
            }
        }
    }

    pub async fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Stream(event) => {
                self.state
                    .lock()
                    .expect("state mutex poisoned")
                    .record_stream_event();
                if dispatch::should_lock_vault(&event) {
                    self.signals.emit(Signal::VaultLockRequested {
                        reason: format!("owner grant {} revoked", event.scope),
                    });
                }
                self.debouncer
                    .trigger(TriggerSource::Stream, dispatch::refresh_set_for(event.action));
            }
            ClientEvent::Push => {
                self.debouncer.trigger(TriggerSource::Push, RefreshSet::ALL);
            }
            ClientEvent::RefreshDue(set) => {
                self.fetcher.run(set, true).await;
            }
            ClientEvent::ManualRefresh => {
                self.fetcher.run(RefreshSet::ALL, true).await;
            }
            ClientEvent::StreamUp => {
                self.state
                    .lock()
                    .expect("state mutex poisoned")
                    .stream_connected = true;
                info!("consent event stream connected");
            }
            ClientEvent::StreamDown { reason } => {
                self.state
                    .lock()
                    .expect("state mutex poisoned")
                    .stream_connected = false;
                warn!(%reason, "consent event stream disconnected");
            }
        }
    }

    fn handle_signal(&self, signal: Signal) {
        match signal {
            Signal::ActionCompleted { action, key } => {
                debug!(action = action.as_str(), %key, "action completed; scheduling refresh");
                self.debouncer.trigger(TriggerSource::Action, RefreshSet::ALL);
            }
            // Emitted for downstream consumers; nothing to do here.
            Signal::VaultLockRequested { .. } => {}
        }
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
