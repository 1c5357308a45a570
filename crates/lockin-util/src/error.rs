//! Error types for lockind

use thiserror::Error;

/// Core error type for lockdown operations
#[derive(Debug, Error)]
pub enum LockinError {
    #[error("No active lockdown")]
    NoActiveLockdown,

    #[error("Lockdown already active")]
    LockdownAlreadyActive,

    #[error("Invalid duration: {0} minutes")]
    InvalidDuration(i64),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Rule sink error: {0}")]
    RuleSinkError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Rate limited")]
    RateLimited,
}

impl LockinError {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }

    pub fn rule_sink(msg: impl Into<String>) -> Self {
        Self::RuleSinkError(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, LockinError>;
