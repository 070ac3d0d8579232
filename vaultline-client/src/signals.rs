//! Typed cross-component signal bus.
//!
//! Replaces ambient same-tab custom events with an explicitly constructed
//! channel injected into both producer and consumer, so the dependency is
//! visible in each component's interface.

use tokio::sync::broadcast;
use vaultline_core::ActionKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// The owner's master grant was revoked out-of-band; the host
    /// application must force re-authentication.
    VaultLockRequested { reason: String },
    /// A user-initiated mutation completed successfully.
    ActionCompleted { action: ActionKind, key: String },
}

#[derive(Debug, Clone)]
pub struct SignalBus {
    tx: broadcast::Sender<Signal>,
}

impl SignalBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit to all current subscribers. A bus with no subscribers drops the
    /// signal, which is fine: nothing was listening.
    pub fn emit(&self, signal: Signal) {
        let _ = self.tx.send(signal);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.tx.subscribe()
    }
}
