//! Refresh coordination policy: which read models each trigger re-fetches.

use crate::config::DebounceConfig;
use crate::debounce::Coalesce;
use std::time::Duration;
use vaultline_core::{ConsentAction, ConsentEvent};

/// Which of the three read models a trigger should re-fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSet {
    pub pending: bool,
    pub active: bool,
    pub audit: bool,
}

impl RefreshSet {
    pub const NONE: RefreshSet = RefreshSet {
        pending: false,
        active: false,
        audit: false,
    };

    pub const ALL: RefreshSet = RefreshSet {
        pending: true,
        active: true,
        audit: true,
    };

    pub const fn union(self, other: RefreshSet) -> RefreshSet {
        RefreshSet {
            pending: self.pending || other.pending,
            active: self.active || other.active,
            audit: self.audit || other.audit,
        }
    }

    pub const fn is_empty(self) -> bool {
        !self.pending && !self.active && !self.audit
    }
}

impl Coalesce for RefreshSet {
    fn coalesce(&mut self, other: Self) {
        *self = self.union(other);
    }
}

/// The three independent trigger sources feeding the coordinator.
///
/// Each debounces on its own timer; a burst within one source coalesces
/// into a single refresh timed from the last event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerSource {
    /// Out-of-process push notification channel.
    Push,
    /// Typed consent lifecycle event stream.
    Stream,
    /// Local action completion. No quiet window: the mutation already
    /// round-tripped, so the backend state is settled.
    Action,
}

impl TriggerSource {
    pub fn quiet_window(self, config: &DebounceConfig) -> Duration {
        match self {
            TriggerSource::Push => Duration::from_millis(config.push_quiet_ms),
            TriggerSource::Stream => Duration::from_millis(config.stream_quiet_ms),
            TriggerSource::Action => Duration::ZERO,
        }
    }
}

/// Selective dispatch table for typed stream events.
///
/// Unrecognized actions refresh everything; over-fetching is the safe
/// failure mode for a read model.
pub fn refresh_set_for(action: ConsentAction) -> RefreshSet {
    match action {
        ConsentAction::Requested => RefreshSet {
            pending: true,
            active: false,
            audit: true,
        },
        ConsentAction::ConsentGranted => RefreshSet::ALL,
        ConsentAction::ConsentDenied | ConsentAction::TimedOut => RefreshSet {
            pending: true,
            active: false,
            audit: true,
        },
        ConsentAction::Revoked => RefreshSet {
            pending: false,
            active: true,
            audit: true,
        },
        ConsentAction::Cancelled
        | ConsentAction::OperationPerformed
        | ConsentAction::Unknown => RefreshSet::ALL,
    }
}

/// Whether a stream event revokes the owner's master grant and must force
/// re-authentication.
pub fn should_lock_vault(event: &ConsentEvent) -> bool {
    event.action == ConsentAction::Revoked && event.scope.is_owner_grant()
}
