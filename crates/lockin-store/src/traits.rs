//! Store trait definitions

use crate::{AuditEvent, RecordKey, RecordPatch, StoreResult};

/// Main store trait
///
/// The key-value half has no transactions: every `set` is last-write-wins
/// per key. Callers that need read-modify-write atomicity serialize
/// themselves.
pub trait Store: Send + Sync {
    // Key-value record

    /// Read the given keys; missing keys are absent from the result
    fn get(&self, keys: &[RecordKey]) -> StoreResult<RecordPatch>;

    /// Write every key present in `patch`
    fn set(&self, patch: &RecordPatch) -> StoreResult<()>;

    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
