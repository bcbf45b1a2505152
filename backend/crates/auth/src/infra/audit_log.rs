//! Flat-File Audit Log
//!
//! Append-only JSON array of audit events. The log is best-effort
//! infrastructure: an unreadable log file is replaced rather than treated
//! as fatal (unlike the credential store, it is not a source of truth),
//! and callers are expected to swallow append errors.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entity::audit_event::{AuditAction, AuditEvent, AuditOutcome, AuditReason};
use crate::domain::repository::AuditLog;
use crate::error::AuthResult;

/// JSON-file-backed audit log with optional retention horizon
pub struct FileAuditLog {
    path: PathBuf,
    retention: Option<Duration>,
    lock: Mutex<()>,
}

impl FileAuditLog {
    pub fn new(path: impl Into<PathBuf>, retention: Option<Duration>) -> Self {
        Self {
            path: path.into(),
            retention,
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_rows(&self) -> Vec<StoredAuditEvent> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read audit log");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<StoredAuditEvent>>(&raw) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Audit log unparsable, starting a fresh log"
                );
                Vec::new()
            }
        }
    }

    async fn write_rows(&self, rows: &[StoredAuditEvent]) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(rows)?;
        tokio::fs::write(&self.path, json.as_bytes()).await?;
        Ok(())
    }

    fn retained(&self, rows: Vec<StoredAuditEvent>) -> Vec<StoredAuditEvent> {
        match self.retention_cutoff() {
            Some(cutoff) => rows
                .into_iter()
                .filter(|row| is_retained(&row.timestamp, cutoff))
                .collect(),
            None => rows,
        }
    }

    fn retention_cutoff(&self) -> Option<DateTime<Utc>> {
        let retention = self.retention?;
        let retention = chrono::Duration::from_std(retention).ok()?;
        Some(Utc::now() - retention)
    }
}

/// Pure retention predicate over the stored timestamp
///
/// Rows whose timestamp fails to parse are treated as already expired and
/// dropped, never retained forever.
fn is_retained(timestamp: &str, cutoff: DateTime<Utc>) -> bool {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(ts) => ts.with_timezone(&Utc) >= cutoff,
        Err(_) => false,
    }
}

impl AuditLog for FileAuditLog {
    async fn append(&self, event: AuditEvent) -> AuthResult<()> {
        let _guard = self.lock.lock().await;

        let rows = self.load_rows().await;
        let mut rows = self.retained(rows);
        rows.push(StoredAuditEvent::from_domain(&event));
        self.write_rows(&rows).await
    }

    async fn read_all(&self) -> AuthResult<Vec<AuditEvent>> {
        let _guard = self.lock.lock().await;

        let rows = self.load_rows().await;
        let rows = self.retained(rows);

        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_domain())
            .collect())
    }

    async fn clear(&self) -> AuthResult<()> {
        let _guard = self.lock.lock().await;
        self.write_rows(&[]).await
    }
}

// ============================================================================
// Storage representation
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct StoredAuditEvent {
    id: String,
    timestamp: String,
    action: String,
    identity: String,
    outcome: String,
    reason: String,
    #[serde(default)]
    metadata: serde_json::Value,
}

impl StoredAuditEvent {
    fn from_domain(event: &AuditEvent) -> Self {
        Self {
            id: event.id.to_string(),
            timestamp: event.timestamp.to_rfc3339(),
            action: event.action.code().to_string(),
            identity: event.identity.clone(),
            outcome: event.outcome.code().to_string(),
            reason: event.reason.code().to_string(),
            metadata: event.metadata.clone(),
        }
    }

    /// Rows that no longer parse are skipped; the log is not a source of
    /// truth and a damaged row must not block the rest
    fn into_domain(self) -> Option<AuditEvent> {
        let id = Uuid::from_str(&self.id).ok()?;
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()?
            .with_timezone(&Utc);
        let action = AuditAction::from_code(&self.action)?;
        let outcome = AuditOutcome::from_code(&self.outcome)?;
        let reason = AuditReason::from_code(&self.reason)?;

        Some(AuditEvent {
            id: id.into(),
            timestamp,
            action,
            identity: self.identity,
            outcome,
            reason,
            metadata: self.metadata,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
