//! Persisted session state, consulted at mount but owned elsewhere.
//!
//! The identity layer writes `session_token`, `session_token_expires`, and
//! `user_id` to a local JSON file; this module reads them to seed the
//! session projection and the acting user id for fetches.

use serde::{Deserialize, Serialize};
use std::path::Path;
use vaultline_core::{Scope, SessionInfo, Timestamp, UserId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedSession {
    pub session_token: Option<String>,
    pub session_token_expires: Option<Timestamp>,
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub granted_scope: Option<Scope>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub fn load(path: &Path) -> Result<Option<PersistedSession>, SessionStoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    let session = serde_json::from_str::<PersistedSession>(&contents)?;
    Ok(Some(session))
}

pub fn save(path: &Path, session: &PersistedSession) -> Result<(), SessionStoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(session)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Project the persisted token fields into the dashboard's session view.
///
/// The session is active only while a token is present and unexpired; an
/// expiry-less token is treated as inactive rather than eternal.
pub fn derive_session(persisted: Option<&PersistedSession>, now: Timestamp) -> SessionInfo {
    let Some(persisted) = persisted else {
        return SessionInfo::default();
    };
    let unexpired = persisted
        .session_token_expires
        .map(|expires| expires > now)
        .unwrap_or(false);
    SessionInfo {
        is_active: persisted.session_token.is_some() && unexpired,
        expires_at: persisted.session_token_expires,
        token: persisted.session_token.clone(),
        scope: persisted.granted_scope.clone(),
    }
}
