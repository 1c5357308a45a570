//! Shared types for the lockind API

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Domain;

/// Why a lockdown ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The end time was reached (recurring check or terminal alarm)
    Expired,
    /// The unlock secret was typed in full
    Unlocked,
    /// Explicit kill command
    Manual,
}

/// Lifecycle state of the lockdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockdownState {
    Idle,
    Active,
}

/// Progress of the unlock code being typed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnlockProgress {
    /// Whether the last candidate was accepted
    pub accepted: bool,
    /// Whether the full secret has been typed
    pub complete: bool,
    /// Characters accepted so far
    pub typed: usize,
    /// Total characters in the secret
    pub total: usize,
}

/// Read-only view of the lockdown
///
/// Never contains the unlock secret itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockdownStatus {
    pub api_version: u32,
    pub state: LockdownState,
    pub end_time: Option<DateTime<Local>>,
    pub time_remaining: Duration,
    /// Allow-list as entered by the user
    pub allowlist: Vec<String>,
    /// Allow-list after alias expansion (empty while idle)
    #[serde(default)]
    pub expanded_allowlist: Vec<Domain>,
    pub unlock: UnlockProgress,
}

impl LockdownStatus {
    pub fn is_active(&self) -> bool {
        self.state == LockdownState::Active
    }
}

/// Role for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientRole {
    /// Popup/CLI - can view state, start lockdowns, type the unlock code
    Shell,
    /// Local admin - can also kill an active lockdown
    Admin,
    /// Read-only observer
    Observer,
}

impl ClientRole {
    pub fn can_start(&self) -> bool {
        matches!(self, ClientRole::Shell | ClientRole::Admin)
    }

    pub fn can_unlock(&self) -> bool {
        matches!(self, ClientRole::Shell | ClientRole::Admin)
    }

    pub fn can_edit_allowlist(&self) -> bool {
        matches!(self, ClientRole::Shell | ClientRole::Admin)
    }

    pub fn can_kill(&self) -> bool {
        matches!(self, ClientRole::Admin)
    }
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub live: bool,
    pub ready: bool,
    pub config_loaded: bool,
    pub rule_sink_ok: bool,
    pub store_ok: bool,
}
