//! Command types for the lockind protocol

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use lockin_util::ClientId;

use crate::{ClientRole, LockdownStatus, UnlockProgress, API_VERSION};

/// Request wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// The command
    pub command: Command,
}

impl Request {
    pub fn new(request_id: u64, command: Command) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }
}

/// Response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// Response payload or error
    pub result: ResponseResult,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Ok(payload),
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Err(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseResult {
    Ok(ResponsePayload),
    Err(ErrorInfo),
}

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error codes for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    InvalidDuration,
    InvalidDomain,
    NoActiveLockdown,
    LockdownActive,
    PermissionDenied,
    RateLimited,
    StoreError,
    RuleSinkError,
}

/// When a requested lockdown should end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockdownEnd {
    /// Absolute end time
    At(DateTime<Local>),
    /// Relative to when the daemon handles the request
    AfterMinutes(i64),
}

/// All possible commands from clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Get the current lockdown status
    GetState,

    /// Start a lockdown restricted to `allowlist`
    StartLockdown {
        end: LockdownEnd,
        allowlist: Vec<String>,
    },

    /// Kill the active lockdown without the unlock code (admin only)
    StopLockdown,

    /// Submit the unlock code as typed so far
    SubmitUnlock { candidate: String },

    /// Show the unlock secret of the active lockdown
    RevealSecret,

    /// Replace the stored allow-list (idle only)
    SetAllowlist { allowlist: Vec<String> },

    /// Subscribe to events (returns immediately, events stream separately)
    SubscribeEvents,

    /// Unsubscribe from events
    UnsubscribeEvents,

    /// Get health status
    GetHealth,

    /// Ping for keepalive
    Ping,
}

/// Response payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    State(LockdownStatus),
    LockdownStarted {
        end_time: DateTime<Local>,
        /// Shown once to the user; needed to unlock early
        secret: String,
    },
    /// The requested end time was not in the future; nothing changed
    LockdownNotStarted,
    Stopped,
    NotActive,
    Unlock(UnlockProgress),
    Secret {
        secret: String,
    },
    AllowlistUpdated {
        allowlist: Vec<String>,
    },
    Subscribed {
        client_id: ClientId,
    },
    Unsubscribed,
    Health(crate::HealthStatus),
    Pong,
}

/// Client connection info (set by IPC layer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_id: ClientId,
    pub role: ClientRole,
    /// Unix UID if available
    pub uid: Option<u32>,
}

impl ClientInfo {
    pub fn new(role: ClientRole) -> Self {
        Self {
            client_id: ClientId::new(),
            role,
            uid: None,
        }
    }

    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_command_wire_format() {
        let req = Request::new(
            7,
            Command::StartLockdown {
                end: LockdownEnd::AfterMinutes(30),
                allowlist: vec!["youtu.be".into()],
            },
        );
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["request_id"], 7);
        assert_eq!(json["command"]["type"], "start_lockdown");
        assert_eq!(json["command"]["end"]["after_minutes"], 30);
        assert_eq!(json["command"]["allowlist"][0], "youtu.be");
    }

    #[test]
    fn parses_unlock_command() {
        let json = r#"{"request_id":2,"api_version":1,"command":{"type":"submit_unlock","candidate":"abc"}}"#;
        let req: Request = serde_json::from_str(json).unwrap();

        assert!(matches!(
            req.command,
            Command::SubmitUnlock { ref candidate } if candidate == "abc"
        ));
    }

    #[test]
    fn error_response_serialization() {
        let resp = Response::error(
            3,
            ErrorInfo::new(ErrorCode::LockdownActive, "Lockdown already active"),
        );
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("lockdown_active"));

        let parsed: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.request_id, 3);
        assert!(matches!(parsed.result, ResponseResult::Err(_)));
    }
}
