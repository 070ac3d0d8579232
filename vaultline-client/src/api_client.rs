//! REST client for the consent backend.

use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::time::Duration;
use vaultline_core::{ActiveConsent, AuditLogEntry, PendingConsentRequest, Scope, UserId};

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Config error: {0}")]
    Config(String),
}

/// Operations the synchronization loop needs from the consent backend.
///
/// The engine and the action dispatcher depend on this trait, not on
/// [`RestClient`] directly.
#[async_trait]
pub trait ConsentApi: Send + Sync {
    async fn list_pending(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PendingConsentRequest>, ApiClientError>;

    async fn list_history(
        &self,
        user_id: UserId,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<AuditLogEntry>, ApiClientError>;

    /// Requires an authenticated owner context; callers without a bearer
    /// token must skip the call entirely.
    async fn list_active(
        &self,
        user_id: UserId,
        bearer: &str,
    ) -> Result<Vec<ActiveConsent>, ApiClientError>;

    async fn approve(&self, request_id: &str, bearer: Option<&str>)
        -> Result<(), ApiClientError>;

    async fn deny(&self, request_id: &str, bearer: Option<&str>) -> Result<(), ApiClientError>;

    async fn revoke(&self, scope: &Scope, bearer: Option<&str>) -> Result<(), ApiClientError>;
}

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderMap,
}

#[derive(Debug, Deserialize)]
struct PendingEnvelope {
    #[serde(default)]
    pending: Vec<PendingConsentRequest>,
}

#[derive(Debug, Deserialize)]
struct ActiveEnvelope {
    #[serde(default)]
    active: Vec<ActiveConsent>,
}

/// Error body the backend returns on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

#[derive(serde::Serialize)]
struct UserQuery {
    user_id: UserId,
}

#[derive(serde::Serialize)]
struct HistoryQuery {
    user_id: UserId,
    page: u32,
    page_size: u32,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let auth_header = build_auth_headers(config.api_key.as_deref())?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    async fn get_value<Q>(
        &self,
        path: &str,
        query: &Q,
        bearer: Option<&str>,
    ) -> Result<serde_json::Value, ApiClientError>
    where
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .get(url)
            .headers(self.auth_header.clone())
            .query(query);
        if let Some(bearer) = bearer {
            request = request.bearer_auth(bearer);
        }
        let response = request.send().await?;
        self.parse_response(response).await
    }

    async fn post_json<B>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<(), ApiClientError>
    where
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .post(url)
            .headers(self.auth_header.clone())
            .json(body);
        if let Some(bearer) = bearer {
            request = request.bearer_auth(bearer);
        }
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(self.error_from_body(status, response).await)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            Err(self.error_from_body(status, response).await)
        }
    }

    async fn error_from_body(
        &self,
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> ApiClientError {
        let text = response.text().await.unwrap_or_default();
        if let Ok(body) = serde_json::from_str::<ApiErrorBody>(&text) {
            let code = body.code.unwrap_or_else(|| status.as_u16().to_string());
            return ApiClientError::InvalidResponse(format!("{}: {}", code, body.message));
        }
        ApiClientError::InvalidResponse(format!("HTTP {}: {}", status.as_u16(), text))
    }
}

#[async_trait]
impl ConsentApi for RestClient {
    async fn list_pending(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PendingConsentRequest>, ApiClientError> {
        let value = self
            .get_value("/api/v1/consents/pending", &UserQuery { user_id }, None)
            .await?;
        let envelope: PendingEnvelope = serde_json::from_value(value)?;
        Ok(envelope.pending)
    }

    async fn list_history(
        &self,
        user_id: UserId,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<AuditLogEntry>, ApiClientError> {
        let value = self
            .get_value(
                "/api/v1/consents/history",
                &HistoryQuery {
                    user_id,
                    page,
                    page_size,
                },
                None,
            )
            .await?;
        Ok(normalize_history(value))
    }

    async fn list_active(
        &self,
        user_id: UserId,
        bearer: &str,
    ) -> Result<Vec<ActiveConsent>, ApiClientError> {
        let value = self
            .get_value(
                "/api/v1/consents/active",
                &UserQuery { user_id },
                Some(bearer),
            )
            .await?;
        let envelope: ActiveEnvelope = serde_json::from_value(value)?;
        Ok(envelope.active)
    }

    async fn approve(
        &self,
        request_id: &str,
        bearer: Option<&str>,
    ) -> Result<(), ApiClientError> {
        let path = format!("/api/v1/consents/{}/approve", request_id);
        self.post_json(&path, &serde_json::json!({}), bearer).await
    }

    async fn deny(&self, request_id: &str, bearer: Option<&str>) -> Result<(), ApiClientError> {
        let path = format!("/api/v1/consents/{}/deny", request_id);
        self.post_json(&path, &serde_json::json!({}), bearer).await
    }

    async fn revoke(&self, scope: &Scope, bearer: Option<&str>) -> Result<(), ApiClientError> {
        self.post_json(
            "/api/v1/consents/revoke",
            &serde_json::json!({ "scope": scope }),
            bearer,
        )
        .await
    }
}

/// Normalize the consent-history payload across the shapes the backend has
/// shipped: a bare array, `{"items": [...]}`, or `{"history": [...]}`.
/// Anything else yields the empty list. Rows that fail to decode are
/// dropped individually rather than poisoning the page.
pub fn normalize_history(value: serde_json::Value) -> Vec<AuditLogEntry> {
    let rows = match value {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(mut map) => {
            match map.remove("items").or_else(|| map.remove("history")) {
                Some(serde_json::Value::Array(rows)) => rows,
                _ => return Vec::new(),
            }
        }
        _ => return Vec::new(),
    };
    rows.into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect()
}

fn build_auth_headers(api_key: Option<&str>) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    if let Some(api_key) = api_key {
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(api_key).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry_json(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "token_id": "tok-1",
            "agent_id": "agent-1",
            "scope": "read-health",
            "action": "REQUESTED",
            "issued_at": "2026-05-01T12:00:00Z",
            "token_type": "consent",
            "request_id": "req-1",
            "is_timed_out": false
        })
    }

    #[test]
    fn test_normalize_bare_array() {
        let entries = normalize_history(json!([entry_json("a"), entry_json("b")]));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "a");
    }

    #[test]
    fn test_normalize_items_and_history_envelopes() {
        let from_items = normalize_history(json!({ "items": [entry_json("a")] }));
        let from_history = normalize_history(json!({ "history": [entry_json("a")] }));
        assert_eq!(from_items, from_history);
        assert_eq!(from_items.len(), 1);
    }

    #[test]
    fn test_normalize_unrecognized_shape_is_empty() {
        assert!(normalize_history(json!({ "rows": [entry_json("a")] })).is_empty());
        assert!(normalize_history(json!("nonsense")).is_empty());
        assert!(normalize_history(json!(42)).is_empty());
        assert!(normalize_history(json!(null)).is_empty());
    }

    #[test]
    fn test_normalize_drops_undecodable_rows() {
        let entries = normalize_history(json!([entry_json("a"), { "garbage": true }]));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "a");
    }

    #[test]
    fn test_auth_headers_carry_api_key() {
        let headers = build_auth_headers(Some("key-1")).unwrap();
        assert_eq!(headers.get("x-api-key").unwrap(), "key-1");
        assert!(build_auth_headers(None).unwrap().is_empty());
    }
}
