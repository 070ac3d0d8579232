//! Event types for the engine loop.

use crate::dispatch::RefreshSet;
use vaultline_core::ConsentEvent;

#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Typed message from the consent lifecycle stream.
    Stream(ConsentEvent),
    /// Out-of-process push notification arrived. The payload is opaque to
    /// this subsystem; only the arrival matters.
    Push,
    /// A debounce window settled; run the coalesced refresh now.
    RefreshDue(RefreshSet),
    /// The user asked for an immediate full refresh.
    ManualRefresh,
    StreamUp,
    StreamDown { reason: String },
}
