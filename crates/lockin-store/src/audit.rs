//! Audit event types

use chrono::{DateTime, Local};
use lockin_api::StopReason;
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Service started
    ServiceStarted,

    /// Service stopped
    ServiceStopped,

    /// Configuration loaded
    ConfigLoaded { alias_groups: usize },

    /// Session record initialized on first install
    RecordInstalled,

    /// Lockdown started
    LockdownStarted {
        end_time: DateTime<Local>,
        allowlist_len: usize,
        expanded_len: usize,
    },

    /// Lockdown ended
    LockdownEnded { reason: StopReason },

    /// Active lockdown restored after restart
    LockdownRecovered { end_time: DateTime<Local> },

    /// Stored allow-list replaced
    AllowlistUpdated { entries: usize },

    /// Client connected
    ClientConnected {
        client_id: String,
        role: String,
        uid: Option<u32>,
    },

    /// Client disconnected
    ClientDisconnected { client_id: String },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Row id, assigned by the store
    pub id: i64,

    pub timestamp: DateTime<Local>,

    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0,
            timestamp: lockin_util::now(),
            event,
        }
    }
}
