//! Cache-first fetch functions for the three read models.
//!
//! Fetches populate both dashboard state and the cache. Failures on the
//! synchronization path are logged and swallowed so the user keeps seeing
//! stale-but-valid data; there is no retry here. The next event, tick, or
//! manual refresh is the retry.

use crate::api_client::{ApiClientError, ConsentApi};
use crate::cache::{self, CacheStore};
use crate::dispatch::RefreshSet;
use crate::state::DashboardState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use vaultline_core::{TtlClass, UserId};

pub struct Fetcher {
    api: Arc<dyn ConsentApi>,
    cache: Arc<CacheStore>,
    state: Arc<Mutex<DashboardState>>,
    user_id: UserId,
    history_page_size: u32,
    /// Set at teardown; responses resolving after it are discarded.
    closed: Arc<AtomicBool>,
}

impl Fetcher {
    pub fn new(
        api: Arc<dyn ConsentApi>,
        cache: Arc<CacheStore>,
        state: Arc<Mutex<DashboardState>>,
        user_id: UserId,
        history_page_size: u32,
        closed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            api,
            cache,
            state,
            user_id,
            history_page_size,
            closed,
        }
    }

    /// Run the selected subset, swallowing failures.
    pub async fn run(&self, set: RefreshSet, force: bool) {
        if set.pending {
            if let Err(err) = self.fetch_pending(force).await {
                warn!(error = %err, "pending-consent refresh failed; keeping stale data");
            }
        }
        if set.active {
            if let Err(err) = self.fetch_active(force).await {
                warn!(error = %err, "active-consent refresh failed; keeping stale data");
            }
        }
        if set.audit {
            if let Err(err) = self.fetch_audit(force).await {
                warn!(error = %err, "audit-log refresh failed; keeping stale data");
            }
        }
    }

    pub async fn fetch_pending(&self, force: bool) -> Result<(), ApiClientError> {
        let key = cache::pending_key(self.user_id);
        if !force {
            if let Some(rows) = self.cache.get(&key) {
                self.state_mut(|state| state.set_pending(rows));
                return Ok(());
            }
        }
        let rows = self.api.list_pending(self.user_id).await?;
        if self.is_closed() {
            return Ok(());
        }
        self.cache.set(&key, &rows, TtlClass::Short.duration());
        self.state_mut(|state| state.set_pending(rows));
        Ok(())
    }

    pub async fn fetch_audit(&self, force: bool) -> Result<(), ApiClientError> {
        let key = cache::audit_key(self.user_id);
        if !force {
            if let Some(rows) = self.cache.get(&key) {
                self.state_mut(|state| state.set_audit(rows));
                return Ok(());
            }
        }
        let rows = self
            .api
            .list_history(self.user_id, 0, self.history_page_size)
            .await?;
        if self.is_closed() {
            return Ok(());
        }
        self.cache.set(&key, &rows, TtlClass::Short.duration());
        self.state_mut(|state| state.set_audit(rows));
        Ok(())
    }

    /// Listing active consents requires the authenticated owner context;
    /// without a bearer token there is nothing to fetch.
    pub async fn fetch_active(&self, force: bool) -> Result<(), ApiClientError> {
        let Some(bearer) = self.bearer() else {
            debug!("skipping active-consent fetch: no session token");
            return Ok(());
        };
        let key = cache::active_key(self.user_id);
        if !force {
            if let Some(rows) = self.cache.get(&key) {
                self.state_mut(|state| state.set_active(rows));
                return Ok(());
            }
        }
        let rows = self.api.list_active(self.user_id, &bearer).await?;
        if self.is_closed() {
            return Ok(());
        }
        self.cache.set(&key, &rows, TtlClass::Short.duration());
        self.state_mut(|state| state.set_active(rows));
        Ok(())
    }

    fn bearer(&self) -> Option<String> {
        self.state
            .lock()
            .expect("state mutex poisoned")
            .session
            .bearer()
            .map(String::from)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn state_mut(&self, apply: impl FnOnce(&mut DashboardState)) {
        if self.is_closed() {
            return;
        }
        apply(&mut self.state.lock().expect("state mutex poisoned"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::AtomicU32;
    use vaultline_core::{
        ActiveConsent, AuditLogEntry, PendingConsentRequest, Scope, SessionInfo,
    };

    #[derive(Default)]
    struct MockApi {
        pending_calls: AtomicU32,
        history_calls: AtomicU32,
        active_calls: AtomicU32,
        fail: AtomicBool,
    }

    impl MockApi {
        fn pending_row() -> PendingConsentRequest {
            PendingConsentRequest {
                id: "req-1".to_string(),
                developer: "acme".to_string(),
                scope: Scope::from("read-health"),
                scope_description: "Health records".to_string(),
                requested_at: Utc::now(),
                expiry_hours: 24,
            }
        }

        fn counts(&self) -> (u32, u32, u32) {
            (
                self.pending_calls.load(Ordering::SeqCst),
                self.active_calls.load(Ordering::SeqCst),
                self.history_calls.load(Ordering::SeqCst),
            )
        }

        fn check_failure(&self) -> Result<(), ApiClientError> {
            if self.fail.load(Ordering::SeqCst) {
                Err(ApiClientError::InvalidResponse("backend down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ConsentApi for MockApi {
        async fn list_pending(
            &self,
            _user_id: UserId,
        ) -> Result<Vec<PendingConsentRequest>, ApiClientError> {
            self.pending_calls.fetch_add(1, Ordering::SeqCst);
            self.check_failure()?;
            Ok(vec![Self::pending_row()])
        }

        async fn list_history(
            &self,
            _user_id: UserId,
            _page: u32,
            _page_size: u32,
        ) -> Result<Vec<AuditLogEntry>, ApiClientError> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            self.check_failure()?;
            Ok(Vec::new())
        }

        async fn list_active(
            &self,
            _user_id: UserId,
            _bearer: &str,
        ) -> Result<Vec<ActiveConsent>, ApiClientError> {
            self.active_calls.fetch_add(1, Ordering::SeqCst);
            self.check_failure()?;
            Ok(Vec::new())
        }

        async fn approve(
            &self,
            _request_id: &str,
            _bearer: Option<&str>,
        ) -> Result<(), ApiClientError> {
            Ok(())
        }

        async fn deny(
            &self,
            _request_id: &str,
            _bearer: Option<&str>,
        ) -> Result<(), ApiClientError> {
            Ok(())
        }

        async fn revoke(
            &self,
            _scope: &Scope,
            _bearer: Option<&str>,
        ) -> Result<(), ApiClientError> {
            Ok(())
        }
    }

    fn active_session() -> SessionInfo {
        SessionInfo {
            is_active: true,
            expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
            token: Some("tok".to_string()),
            scope: None,
        }
    }

    fn fetcher(session: SessionInfo) -> (Arc<MockApi>, Fetcher, Arc<Mutex<DashboardState>>) {
        let api = Arc::new(MockApi::default());
        let state = Arc::new(Mutex::new(DashboardState::new(session)));
        let fetcher = Fetcher::new(
            api.clone(),
            Arc::new(CacheStore::new()),
            state.clone(),
            uuid::Uuid::now_v7(),
            50,
            Arc::new(AtomicBool::new(false)),
        );
        (api, fetcher, state)
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let (api, fetcher, state) = fetcher(active_session());

        fetcher.fetch_pending(false).await.unwrap();
        fetcher.fetch_pending(false).await.unwrap();

        // Second call was served from cache.
        assert_eq!(api.pending_calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.lock().unwrap().pending.len(), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_valid_cache() {
        let (api, fetcher, _state) = fetcher(active_session());

        fetcher.fetch_pending(false).await.unwrap();
        fetcher.fetch_pending(true).await.unwrap();
        fetcher.fetch_pending(true).await.unwrap();

        assert_eq!(api.pending_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_missing_token_skips_active_fetch() {
        let (api, fetcher, _state) = fetcher(SessionInfo::default());

        fetcher.fetch_active(true).await.unwrap();

        assert_eq!(api.active_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_selective_run_with_token() {
        let (api, fetcher, _state) = fetcher(active_session());

        fetcher.run(RefreshSet::ALL, true).await;

        assert_eq!(api.counts(), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_selective_run_without_token_skips_active_only() {
        let (api, fetcher, _state) = fetcher(SessionInfo::default());

        fetcher.run(RefreshSet::ALL, true).await;

        assert_eq!(api.counts(), (1, 0, 1));
    }

    #[tokio::test]
    async fn test_failure_leaves_existing_state() {
        let (api, fetcher, state) = fetcher(active_session());

        fetcher.fetch_pending(true).await.unwrap();
        assert_eq!(state.lock().unwrap().pending.len(), 1);

        api.fail.store(true, Ordering::SeqCst);
        assert!(fetcher.fetch_pending(true).await.is_err());
        // Stale-but-available: the previous rows are untouched.
        assert_eq!(state.lock().unwrap().pending.len(), 1);

        // run() swallows the failures entirely.
        fetcher.run(RefreshSet::ALL, true).await;
        assert_eq!(state.lock().unwrap().pending.len(), 1);
    }

    #[tokio::test]
    async fn test_closed_fetcher_discards_late_results() {
        let api = Arc::new(MockApi::default());
        let state = Arc::new(Mutex::new(DashboardState::new(active_session())));
        let closed = Arc::new(AtomicBool::new(false));
        let fetcher = Fetcher::new(
            api,
            Arc::new(CacheStore::new()),
            state.clone(),
            uuid::Uuid::now_v7(),
            50,
            closed.clone(),
        );

        closed.store(true, Ordering::SeqCst);
        fetcher.fetch_pending(true).await.unwrap();

        assert!(state.lock().unwrap().pending.is_empty());
        assert!(state.lock().unwrap().last_synced.is_none());
    }
}
