//! Infrastructure Layer
//!
//! Flat-file persistence, the caching wrapper, and the audit log.

pub mod audit_log;
pub mod cached_store;
pub mod file_store;

pub use audit_log::FileAuditLog;
pub use cached_store::CachedCredentialStore;
pub use file_store::JsonFileStore;
