//! Collaborator traits

use async_trait::async_trait;
use chrono::{DateTime, Local};
use lockin_api::{BlockRule, RuleId};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from host collaborators
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Rule update failed: {0}")]
    RuleUpdateFailed(String),

    #[error("Scheduling failed: {0}")]
    ScheduleFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// External authority that enforces blocking rules
///
/// An update is a full replacement step: the listed ids are removed, then
/// the given rules are added. The whole call either succeeds or fails; no
/// partial outcome is reported.
#[async_trait]
pub trait RuleSink: Send + Sync {
    /// Remove rules by id, then add `add_rules`
    async fn update_rules(&self, remove_ids: &[RuleId], add_rules: Vec<BlockRule>)
        -> HostResult<()>;

    /// Rules currently installed
    async fn installed_rules(&self) -> HostResult<Vec<BlockRule>>;

    /// Optional: check if the sink is healthy
    fn is_healthy(&self) -> bool {
        true
    }
}

/// A named alarm that fired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub name: String,
    /// When the alarm was due; `None` for recurring alarms
    pub scheduled_for: Option<DateTime<Local>>,
}

impl Alarm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scheduled_for: None,
        }
    }
}

/// External scheduler of named, possibly-delayed callbacks
///
/// Scheduling a name that already exists replaces it. Fired alarms are
/// delivered on the channel returned by [`Scheduler::subscribe`].
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Fire `name` once at `when` (immediately if `when` is past)
    async fn schedule_at(&self, name: &str, when: DateTime<Local>) -> HostResult<()>;

    /// Fire `name` every `period`
    async fn schedule_recurring(&self, name: &str, period: Duration) -> HostResult<()>;

    /// Cancel `name`; returns whether it was scheduled
    async fn cancel(&self, name: &str) -> HostResult<bool>;

    /// Subscribe to fired alarms. May only be called once.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<Alarm>;
}
