//! Command handling

use chrono::{DateTime, Duration, Local};
use lockin_api::{
    ClientInfo, Command, ErrorCode, ErrorInfo, Event, EventPayload, HealthStatus, LockdownEnd,
    Response, ResponsePayload,
};
use lockin_config::LockdownPolicy;
use lockin_core::{CoreEvent, LockdownEngine, StartOutcome, StopOutcome};
use lockin_util::LockinError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Routes commands from clients to the engine
pub struct Dispatcher {
    engine: Arc<LockdownEngine>,
    policy: LockdownPolicy,
    config_loaded: bool,
}

impl Dispatcher {
    pub fn new(engine: Arc<LockdownEngine>, policy: LockdownPolicy, config_loaded: bool) -> Self {
        Self {
            engine,
            policy,
            config_loaded,
        }
    }

    pub fn engine(&self) -> &Arc<LockdownEngine> {
        &self.engine
    }

    /// Handle one request
    pub async fn handle(
        &self,
        client: &ClientInfo,
        request_id: u64,
        command: Command,
        now: DateTime<Local>,
    ) -> Response {
        match self.execute(client, command, now).await {
            Ok(payload) => Response::success(request_id, payload),
            Err(e) => {
                debug!(request_id, error = %e, "Request failed");
                Response::error(request_id, error_info(&e))
            }
        }
    }

    async fn execute(
        &self,
        client: &ClientInfo,
        command: Command,
        now: DateTime<Local>,
    ) -> Result<ResponsePayload, LockinError> {
        match command {
            Command::GetState => Ok(ResponsePayload::State(self.engine.status(now).await?)),

            Command::StartLockdown { end, allowlist } => {
                if !client.role.can_start() {
                    return Err(LockinError::permission("cannot start a lockdown"));
                }

                let outcome = match end {
                    LockdownEnd::AfterMinutes(minutes) => {
                        if minutes > self.policy.max_duration_minutes {
                            return Err(LockinError::InvalidDuration(minutes));
                        }
                        self.engine.start_for(minutes, allowlist, now).await?
                    }
                    LockdownEnd::At(end_time) => {
                        let length = end_time.signed_duration_since(now);
                        if length > Duration::minutes(self.policy.max_duration_minutes) {
                            return Err(LockinError::InvalidDuration(length.num_minutes()));
                        }
                        self.engine.start_until(end_time, allowlist, now).await?
                    }
                };

                Ok(match outcome {
                    StartOutcome::Started { end_time, secret } => {
                        info!(client_id = %client.client_id, end_time = %end_time, "Lockdown started by client");
                        ResponsePayload::LockdownStarted {
                            end_time,
                            secret: secret.as_str().to_string(),
                        }
                    }
                    StartOutcome::NotStarted => ResponsePayload::LockdownNotStarted,
                })
            }

            Command::StopLockdown => {
                if !client.role.can_kill() {
                    warn!(client_id = %client.client_id, role = ?client.role, "Kill command refused");
                    return Err(LockinError::permission("only an admin may end a lockdown early"));
                }

                Ok(match self.engine.stop(lockin_api::StopReason::Manual).await? {
                    StopOutcome::Stopped => ResponsePayload::Stopped,
                    StopOutcome::NotActive => ResponsePayload::NotActive,
                })
            }

            Command::SubmitUnlock { candidate } => {
                if !client.role.can_unlock() {
                    return Err(LockinError::permission("cannot unlock"));
                }
                Ok(ResponsePayload::Unlock(
                    self.engine.submit_unlock(&candidate).await?,
                ))
            }

            Command::RevealSecret => {
                if !client.role.can_unlock() {
                    return Err(LockinError::permission("cannot reveal the unlock code"));
                }
                match self.engine.reveal_secret().await? {
                    Some(secret) => Ok(ResponsePayload::Secret {
                        secret: secret.as_str().to_string(),
                    }),
                    None => Err(LockinError::NoActiveLockdown),
                }
            }

            Command::SetAllowlist { allowlist } => {
                if !client.role.can_edit_allowlist() {
                    return Err(LockinError::permission("cannot edit the allow-list"));
                }
                let allowlist = self.engine.set_allowlist(allowlist).await?;
                Ok(ResponsePayload::AllowlistUpdated { allowlist })
            }

            Command::SubscribeEvents => Ok(ResponsePayload::Subscribed {
                client_id: client.client_id.clone(),
            }),

            Command::UnsubscribeEvents => Ok(ResponsePayload::Unsubscribed),

            Command::GetHealth => Ok(ResponsePayload::Health(HealthStatus {
                live: true,
                ready: true,
                config_loaded: self.config_loaded,
                rule_sink_ok: self.engine.rule_sink_healthy(),
                store_ok: self.engine.store_healthy(),
            })),

            Command::Ping => Ok(ResponsePayload::Pong),
        }
    }

    /// Protocol events for everything the engine did since the last call
    ///
    /// Any change is followed by one `StateChanged` snapshot.
    pub async fn take_events(&self, now: DateTime<Local>) -> Vec<Event> {
        let core_events = self.engine.drain_events().await;
        if core_events.is_empty() {
            return Vec::new();
        }

        let mut events: Vec<Event> = core_events
            .into_iter()
            .filter_map(core_event_payload)
            .map(Event::new)
            .collect();

        match self.engine.status(now).await {
            Ok(status) => events.push(Event::new(EventPayload::StateChanged(status))),
            Err(e) => warn!(error = %e, "Failed to read status for event"),
        }

        events
    }
}

fn core_event_payload(event: CoreEvent) -> Option<EventPayload> {
    match event {
        CoreEvent::LockdownStarted {
            end_time,
            allowlist,
            expanded,
        } => Some(EventPayload::LockdownStarted {
            end_time,
            allowlist,
            expanded_count: expanded.len(),
        }),
        CoreEvent::LockdownEnded { reason } => Some(EventPayload::LockdownEnded { reason }),
        CoreEvent::LockdownResumed { .. } | CoreEvent::AllowlistUpdated { .. } => None,
    }
}

/// Protocol error for an engine error
pub fn error_info(e: &LockinError) -> ErrorInfo {
    let code = match e {
        LockinError::NoActiveLockdown => ErrorCode::NoActiveLockdown,
        LockinError::LockdownAlreadyActive => ErrorCode::LockdownActive,
        LockinError::InvalidDuration(_) => ErrorCode::InvalidDuration,
        LockinError::InvalidDomain(_) => ErrorCode::InvalidDomain,
        LockinError::PermissionDenied(_) => ErrorCode::PermissionDenied,
        LockinError::RateLimited => ErrorCode::RateLimited,
        LockinError::StoreError(_) => ErrorCode::StoreError,
        LockinError::RuleSinkError(_) => ErrorCode::RuleSinkError,
    };
    ErrorInfo::new(code, e.to_string())
}
