//! Core events emitted by the engine

use chrono::{DateTime, Local};
use lockin_api::StopReason;

use crate::ExpandedAllowlist;

/// Events emitted by the lockdown engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// A lockdown started and its rule is installed
    LockdownStarted {
        end_time: DateTime<Local>,
        allowlist: Vec<String>,
        expanded: ExpandedAllowlist,
    },

    /// An active lockdown was restored after a restart
    LockdownResumed { end_time: DateTime<Local> },

    /// The lockdown ended and its rule was removed
    LockdownEnded { reason: StopReason },

    /// The stored allow-list was replaced
    AllowlistUpdated { allowlist: Vec<String> },
}
