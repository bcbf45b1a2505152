//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the
//! infrastructure layer.

use crate::domain::entity::account::AccountCollection;
use crate::domain::entity::audit_event::AuditEvent;
use crate::error::AuthResult;

/// Credential store trait
///
/// Persistence is whole-collection: callers read the full collection,
/// mutate in memory, and write the full collection back. There is no
/// partial-update API.
#[trait_variant::make(CredentialStore: Send)]
pub trait LocalCredentialStore {
    /// Load the entire credential collection
    ///
    /// A missing backing store materializes as an empty collection (first
    /// run). A present-but-unparsable one is an error; corruption is never
    /// silently replaced with empty data.
    async fn load_all(&self) -> AuthResult<AccountCollection>;

    /// Persist the entire credential collection
    async fn save_all(&self, accounts: &AccountCollection) -> AuthResult<()>;
}

/// Audit log trait
///
/// Append-only; individual events are never updated or deleted. `clear`
/// exists as an administrative bulk operation only.
#[trait_variant::make(AuditLog: Send)]
pub trait LocalAuditLog {
    /// Append one event
    async fn append(&self, event: AuditEvent) -> AuthResult<()>;

    /// Read all retained events, oldest first
    async fn read_all(&self) -> AuthResult<Vec<AuditEvent>>;

    /// Drop every event
    async fn clear(&self) -> AuthResult<()>;
}
