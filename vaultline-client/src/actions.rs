//! User-initiated consent mutations.
//!
//! Each action claims a per-item in-flight flag, calls the backend, and
//! releases the flag on every exit path. Failures surface a user-visible
//! notification; only successful actions signal completion (and thereby
//! trigger a refresh).

use crate::api_client::{ApiClientError, ConsentApi};
use crate::notifications::Notifier;
use crate::signals::{Signal, SignalBus};
use crate::state::DashboardState;
use std::sync::{Arc, Mutex};
use vaultline_core::{ActionKind, Scope};

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// A submission for this item is still in flight; the second click is
    /// rejected rather than duplicated against the backend.
    #[error("{action} already in flight for {key}")]
    AlreadyInFlight { action: &'static str, key: String },
    #[error(transparent)]
    Api(#[from] ApiClientError),
}

pub struct ActionDispatcher {
    api: Arc<dyn ConsentApi>,
    state: Arc<Mutex<DashboardState>>,
    notifier: Arc<Notifier>,
    signals: SignalBus,
}

impl ActionDispatcher {
    pub fn new(
        api: Arc<dyn ConsentApi>,
        state: Arc<Mutex<DashboardState>>,
        notifier: Arc<Notifier>,
        signals: SignalBus,
    ) -> Self {
        Self {
            api,
            state,
            notifier,
            signals,
        }
    }

    pub async fn approve(&self, request_id: &str) -> Result<(), ActionError> {
        self.dispatch(ActionKind::Approve, request_id).await
    }

    pub async fn deny(&self, request_id: &str) -> Result<(), ActionError> {
        self.dispatch(ActionKind::Deny, request_id).await
    }

    /// Revocation targets a scope, not a request; the scope string keys
    /// its in-flight flag.
    pub async fn revoke(&self, scope: &Scope) -> Result<(), ActionError> {
        self.dispatch(ActionKind::Revoke, scope.as_str()).await
    }

    async fn dispatch(&self, action: ActionKind, key: &str) -> Result<(), ActionError> {
        {
            let mut state = self.state.lock().expect("state mutex poisoned");
            if !state.begin_action(key) {
                return Err(ActionError::AlreadyInFlight {
                    action: action.as_str(),
                    key: key.to_string(),
                });
            }
        }

        let bearer = self.bearer();
        let result = match action {
            ActionKind::Approve => self.api.approve(key, bearer.as_deref()).await,
            ActionKind::Deny => self.api.deny(key, bearer.as_deref()).await,
            ActionKind::Revoke => {
                self.api
                    .revoke(&Scope::from(key), bearer.as_deref())
                    .await
            }
        };

        // The flag clears on every exit path, success or failure.
        self.state
            .lock()
            .expect("state mutex poisoned")
            .finish_action(key);

        match result {
            Ok(()) => {
                self.notifier
                    .success(format!("Consent {} completed for {}", action.as_str(), key));
                self.signals.emit(Signal::ActionCompleted {
                    action,
                    key: key.to_string(),
                });
                Ok(())
            }
            Err(err) => {
                self.notifier
                    .error(format!("Consent {} failed for {}: {}", action.as_str(), key, err));
                Err(err.into())
            }
        }
    }

    fn bearer(&self) -> Option<String> {
        self.state
            .lock()
            .expect("state mutex poisoned")
            .session
            .bearer()
            .map(String::from)
    }
}
