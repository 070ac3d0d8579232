//! Shared fixtures for the client test suites.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use vaultline_client::api_client::{ApiClientError, ConsentApi};
use vaultline_client::config::{ClientConfig, DebounceConfig, ReconnectConfig};
use vaultline_core::{
    ActiveConsent, AuditLogEntry, ConsentAction, PendingConsentRequest, Scope, SessionInfo,
    UserId,
};

pub fn base_config() -> ClientConfig {
    ClientConfig {
        api_base_url: "http://localhost:8080".to_string(),
        stream_endpoint: "http://localhost:8080/api/v1/consents/events".to_string(),
        api_key: Some("test-key".to_string()),
        request_timeout_ms: 5_000,
        refresh_interval_ms: 3_600_000,
        history_page_size: 50,
        session_path: "tmp/vaultline-session.json".into(),
        debounce: DebounceConfig {
            push_quiet_ms: 600,
            stream_quiet_ms: 300,
        },
        reconnect: ReconnectConfig {
            initial_ms: 250,
            max_ms: 5_000,
            multiplier: 1.5,
            jitter_ms: 100,
        },
    }
}

pub fn active_session() -> SessionInfo {
    SessionInfo {
        is_active: true,
        expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
        token: Some("bearer-token".to_string()),
        scope: Some(Scope::from("vault.owner")),
    }
}

pub fn pending_row(id: &str) -> PendingConsentRequest {
    PendingConsentRequest {
        id: id.to_string(),
        developer: "acme-analytics".to_string(),
        scope: Scope::from("read-financial-domain"),
        scope_description: "Read access to financial records".to_string(),
        requested_at: Utc::now(),
        expiry_hours: 24,
    }
}

pub fn audit_row(id: &str, action: ConsentAction) -> AuditLogEntry {
    AuditLogEntry {
        id: id.to_string(),
        token_id: "tok-1".to_string(),
        agent_id: "agent-1".to_string(),
        scope: Scope::from("read-financial-domain"),
        action,
        issued_at: Utc::now(),
        expires_at: None,
        token_type: "consent".to_string(),
        request_id: "req-1".to_string(),
        is_timed_out: false,
    }
}

/// Backend double that counts calls per endpoint.
#[derive(Default)]
pub struct RecordingApi {
    pub pending_calls: AtomicU32,
    pub history_calls: AtomicU32,
    pub active_calls: AtomicU32,
    pub approve_calls: AtomicU32,
    pub deny_calls: AtomicU32,
    pub revoke_calls: AtomicU32,
    pub fail_mutations: AtomicBool,
}

impl RecordingApi {
    /// (pending, active, history) call counts.
    pub fn fetch_counts(&self) -> (u32, u32, u32) {
        (
            self.pending_calls.load(Ordering::SeqCst),
            self.active_calls.load(Ordering::SeqCst),
            self.history_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl ConsentApi for RecordingApi {
    async fn list_pending(
        &self,
        _user_id: UserId,
    ) -> Result<Vec<PendingConsentRequest>, ApiClientError> {
        self.pending_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![pending_row("req-1")])
    }

    async fn list_history(
        &self,
        _user_id: UserId,
        _page: u32,
        _page_size: u32,
    ) -> Result<Vec<AuditLogEntry>, ApiClientError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![audit_row("evt-1", ConsentAction::Requested)])
    }

    async fn list_active(
        &self,
        _user_id: UserId,
        _bearer: &str,
    ) -> Result<Vec<ActiveConsent>, ApiClientError> {
        self.active_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn approve(&self, _request_id: &str, _bearer: Option<&str>) -> Result<(), ApiClientError> {
        self.approve_calls.fetch_add(1, Ordering::SeqCst);
        self.mutation_result()
    }

    async fn deny(&self, _request_id: &str, _bearer: Option<&str>) -> Result<(), ApiClientError> {
        self.deny_calls.fetch_add(1, Ordering::SeqCst);
        self.mutation_result()
    }

    async fn revoke(&self, _scope: &Scope, _bearer: Option<&str>) -> Result<(), ApiClientError> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        self.mutation_result()
    }
}

impl RecordingApi {
    fn mutation_result(&self) -> Result<(), ApiClientError> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            Err(ApiClientError::InvalidResponse("mutation refused".to_string()))
        } else {
            Ok(())
        }
    }
}
