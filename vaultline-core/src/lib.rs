//! Vaultline Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! The three primary collections (pending requests, active consents, audit
//! log) are owned by the backend of record; the types here are the client's
//! local projection of that data plus the consent lifecycle event payload
//! carried on the server-sent event stream.

mod entities;
mod enums;
mod event;
mod identity;
mod scope;

pub use entities::{ActiveConsent, AuditLogEntry, PendingConsentRequest, SessionInfo};
pub use enums::{ActionKind, ConsentAction, TtlClass};
pub use event::ConsentEvent;
pub use identity::{new_event_id, DurationMs, Timestamp, UserId};
pub use scope::Scope;
