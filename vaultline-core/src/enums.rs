//! Enumerations shared across the consent dashboard.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Consent lifecycle action, as carried on the event stream and in audit
/// log entries.
///
/// The stream may deliver action names this client does not know about;
/// those deserialize to [`ConsentAction::Unknown`] rather than failing, and
/// dispatch treats them as a signal to refresh everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentAction {
    Requested,
    ConsentGranted,
    ConsentDenied,
    Cancelled,
    /// The stream has emitted both `TIMED_OUT` and `TIMEOUT` for this.
    #[serde(alias = "TIMEOUT")]
    TimedOut,
    Revoked,
    OperationPerformed,
    #[serde(other)]
    Unknown,
}

impl ConsentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentAction::Requested => "REQUESTED",
            ConsentAction::ConsentGranted => "CONSENT_GRANTED",
            ConsentAction::ConsentDenied => "CONSENT_DENIED",
            ConsentAction::Cancelled => "CANCELLED",
            ConsentAction::TimedOut => "TIMED_OUT",
            ConsentAction::Revoked => "REVOKED",
            ConsentAction::OperationPerformed => "OPERATION_PERFORMED",
            ConsentAction::Unknown => "UNKNOWN",
        }
    }
}

/// User-initiated mutation on a consent request or grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Approve,
    Deny,
    Revoke,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Approve => "approve",
            ActionKind::Deny => "deny",
            ActionKind::Revoke => "revoke",
        }
    }
}

/// Retention class for cached read-model entries.
///
/// Collections refreshed by the synchronization loop use `Short`; the
/// longer classes exist for slower-moving lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TtlClass {
    /// ~30 seconds. Event-driven data that the loop re-fetches anyway.
    Short,
    /// ~5 minutes.
    Medium,
    /// ~1 hour.
    Long,
}

impl TtlClass {
    pub fn duration(self) -> Duration {
        match self {
            TtlClass::Short => Duration::from_secs(30),
            TtlClass::Medium => Duration::from_secs(5 * 60),
            TtlClass::Long => Duration::from_secs(60 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consent_action_wire_names() {
        let granted: ConsentAction = serde_json::from_str("\"CONSENT_GRANTED\"").unwrap();
        assert_eq!(granted, ConsentAction::ConsentGranted);
        assert_eq!(
            serde_json::to_string(&ConsentAction::OperationPerformed).unwrap(),
            "\"OPERATION_PERFORMED\""
        );
    }

    #[test]
    fn test_timeout_alias() {
        let a: ConsentAction = serde_json::from_str("\"TIMED_OUT\"").unwrap();
        let b: ConsentAction = serde_json::from_str("\"TIMEOUT\"").unwrap();
        assert_eq!(a, ConsentAction::TimedOut);
        assert_eq!(b, ConsentAction::TimedOut);
    }

    #[test]
    fn test_unrecognized_action_is_unknown() {
        let action: ConsentAction = serde_json::from_str("\"CONSENT_ESCALATED\"").unwrap();
        assert_eq!(action, ConsentAction::Unknown);
    }

    #[test]
    fn test_ttl_class_ordering() {
        assert!(TtlClass::Short.duration() < TtlClass::Medium.duration());
        assert!(TtlClass::Medium.duration() < TtlClass::Long.duration());
    }
}
