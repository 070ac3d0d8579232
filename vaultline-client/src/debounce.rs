//! Per-key trailing-edge debouncing with payload coalescing.
//!
//! The three trigger sources share this one implementation instead of
//! hand-rolling a timer each. A trigger starts (or restarts) its key's
//! quiet window; triggers landing inside the window merge their payloads
//! and push the deadline out, so a burst emits exactly once, timed from
//! the last event. Keys debounce independently. Dropping the debouncer
//! cancels every outstanding timer, so nothing fires after teardown.

use std::collections::HashMap;
use std::future;
use std::hash::Hash;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Merge a newly triggered payload into one already waiting out its quiet
/// window.
pub trait Coalesce {
    fn coalesce(&mut self, other: Self);
}

struct Pending<V> {
    value: V,
    deadline: Instant,
}

pub struct Debouncer<K, V> {
    cmd: mpsc::UnboundedSender<(K, V)>,
    worker: JoinHandle<()>,
}

impl<K, V> Debouncer<K, V>
where
    K: Clone + Eq + Hash + Send + 'static,
    V: Coalesce + Send + 'static,
{
    /// `quiet` maps a key to its quiet window; `out` receives one
    /// `(key, coalesced payload)` per settled burst.
    pub fn new(
        quiet: impl Fn(&K) -> Duration + Send + 'static,
        out: mpsc::Sender<(K, V)>,
    ) -> Self {
        let (cmd, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(rx, quiet, out));
        Self { cmd, worker }
    }

    /// Start or restart the quiet window for `key`, coalescing `value`
    /// into any payload already waiting.
    pub fn trigger(&self, key: K, value: V) {
        let _ = self.cmd.send((key, value));
    }
}

impl<K, V> Drop for Debouncer<K, V> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_worker<K, V>(
    mut rx: mpsc::UnboundedReceiver<(K, V)>,
    quiet: impl Fn(&K) -> Duration,
    out: mpsc::Sender<(K, V)>,
) where
    K: Clone + Eq + Hash,
    V: Coalesce,
{
    let mut pending: HashMap<K, Pending<V>> = HashMap::new();

    loop {
        let next_deadline = pending.values().map(|p| p.deadline).min();

        tokio::select! {
            cmd = rx.recv() => {
                let Some((key, value)) = cmd else {
                    // All handles dropped; outstanding windows die with us.
                    return;
                };
                let deadline = Instant::now() + quiet(&key);
                match pending.entry(key) {
                    std::collections::hash_map::Entry::Occupied(mut slot) => {
                        let slot = slot.get_mut();
                        slot.value.coalesce(value);
                        slot.deadline = deadline;
                    }
                    std::collections::hash_map::Entry::Vacant(slot) => {
                        slot.insert(Pending { value, deadline });
                    }
                }
            }
            _ = sleep_until_or_forever(next_deadline) => {
                let now = Instant::now();
                let due: Vec<K> = pending
                    .iter()
                    .filter(|(_, p)| p.deadline <= now)
                    .map(|(k, _)| k.clone())
                    .collect();
                for key in due {
                    if let Some(p) = pending.remove(&key) {
                        if out.send((key, p.value)).await.is_err() {
                            return;
                        }
                    }
                }
            }
        }
    }
}

async fn sleep_until_or_forever(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}
