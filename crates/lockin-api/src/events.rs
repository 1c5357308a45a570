//! Event types for lockind -> client streaming

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{LockdownStatus, StopReason, API_VERSION};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: lockin_util::now(),
            payload,
        }
    }
}

/// All possible events from the service to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Full status snapshot (sent on major changes)
    StateChanged(LockdownStatus),

    /// A lockdown has started
    LockdownStarted {
        end_time: DateTime<Local>,
        allowlist: Vec<String>,
        expanded_count: usize,
    },

    /// The lockdown has ended and access is unrestricted again
    LockdownEnded { reason: StopReason },

    /// Service is shutting down
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization() {
        let event = Event::new(EventPayload::LockdownEnded {
            reason: StopReason::Expired,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("lockdown_ended"));

        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.api_version, API_VERSION);
        assert!(matches!(
            parsed.payload,
            EventPayload::LockdownEnded {
                reason: StopReason::Expired
            }
        ));
    }
}
