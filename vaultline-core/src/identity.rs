//! Identity and time primitives for Vaultline entities.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Duration in milliseconds for TTL and expiry values.
pub type DurationMs = i64;

/// Identifier of the vault owner, as persisted by the identity backend.
pub type UserId = Uuid;

/// Generate a new UUIDv7 event id (timestamp-sortable).
///
/// Used for locally originated records such as notifications; ids of
/// backend-owned entities arrive over the wire as opaque strings.
pub fn new_event_id() -> Uuid {
    Uuid::now_v7()
}
