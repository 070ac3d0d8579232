//! Core entity structures.
//!
//! These mirror what the consent backend returns, not a canonical schema
//! this client owns. Field tolerance (`serde(default)`) covers backend
//! revisions that omit newer fields from older records.

use crate::{ConsentAction, DurationMs, Scope, Timestamp};
use serde::{Deserialize, Serialize};

/// An access request from a developer awaiting the owner's decision.
///
/// Removed from the pending set on approval, denial, cancellation, or
/// timeout. The pending endpoint speaks camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingConsentRequest {
    pub id: String,
    pub developer: String,
    pub scope: Scope,
    #[serde(default)]
    pub scope_description: String,
    pub requested_at: Timestamp,
    #[serde(default)]
    pub expiry_hours: u32,
}

/// A granted, time-bounded consent.
///
/// Created when a pending request is approved; destroyed on revoke or
/// natural expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveConsent {
    pub id: String,
    pub scope: Scope,
    pub developer: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    #[serde(default)]
    pub time_remaining_ms: DurationMs,
}

/// One append-only entry in the consent lifecycle history.
///
/// Never mutated or deleted locally; purely accumulated from the backend
/// of record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    #[serde(default)]
    pub token_id: String,
    #[serde(default)]
    pub agent_id: String,
    pub scope: Scope,
    pub action: ConsentAction,
    pub issued_at: Timestamp,
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub is_timed_out: bool,
}

/// Local projection of the persisted session token fields.
///
/// Derived at mount from the session store, never fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub is_active: bool,
    pub expires_at: Option<Timestamp>,
    pub token: Option<String>,
    pub scope: Option<Scope>,
}

impl SessionInfo {
    /// Bearer token for authenticated calls, present only while the
    /// session is active.
    pub fn bearer(&self) -> Option<&str> {
        if self.is_active {
            self.token.as_deref()
        } else {
            None
        }
    }
}
