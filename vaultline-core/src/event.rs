//! Consent lifecycle stream payload.

use crate::{ConsentAction, Scope};
use serde::{Deserialize, Serialize};

/// One typed message on the long-lived consent event stream.
///
/// `request_id` and `scope` may be absent for some actions; defaults keep
/// decoding tolerant of the backend's older emitters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentEvent {
    pub action: ConsentAction,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub scope: Scope,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_event_decodes() {
        let json = r#"{"action":"CONSENT_GRANTED","request_id":"req-9","scope":"read-health"}"#;
        let event: ConsentEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.action, ConsentAction::ConsentGranted);
        assert_eq!(event.request_id, "req-9");
        assert_eq!(event.scope.as_str(), "read-health");
    }

    #[test]
    fn test_sparse_event_decodes() {
        let event: ConsentEvent = serde_json::from_str(r#"{"action":"REVOKED"}"#).unwrap();
        assert_eq!(event.action, ConsentAction::Revoked);
        assert!(event.request_id.is_empty());
        assert!(event.scope.as_str().is_empty());
    }
}
