//! Consent scope identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A string identifier describing the class of data or operation a consent
/// authorizes (e.g. `read-financial-domain`).
///
/// Scopes are minted by the backend; the client treats them as opaque except
/// for the owner's master grant, whose revocation must lock the vault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    pub fn new(scope: impl Into<String>) -> Self {
        Self(scope.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this scope denotes the owner's full-access grant.
    ///
    /// The backend has emitted both spellings over time; accept either.
    pub fn is_owner_grant(&self) -> bool {
        matches!(self.0.as_str(), "vault.owner" | "VAULT_OWNER")
    }
}

impl From<&str> for Scope {
    fn from(scope: &str) -> Self {
        Self(scope.to_string())
    }
}

impl From<String> for Scope {
    fn from(scope: String) -> Self {
        Self(scope)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_grant_spellings() {
        assert!(Scope::from("vault.owner").is_owner_grant());
        assert!(Scope::from("VAULT_OWNER").is_owner_grant());
    }

    #[test]
    fn test_ordinary_scope_is_not_owner_grant() {
        assert!(!Scope::from("read-financial-domain").is_owner_grant());
        assert!(!Scope::from("vault.owner.read").is_owner_grant());
        assert!(!Scope::from("").is_owner_grant());
    }

    #[test]
    fn test_serde_transparent() {
        let scope: Scope = serde_json::from_str("\"read-health\"").unwrap();
        assert_eq!(scope.as_str(), "read-health");
        assert_eq!(serde_json::to_string(&scope).unwrap(), "\"read-health\"");
    }
}
