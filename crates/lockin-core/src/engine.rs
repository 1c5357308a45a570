//! Lockdown engine
//!
//! Owns the persisted session record. Every transition runs its
//! read-decide-write inside one async critical section, so the recurring
//! check, the terminal alarm, an unlock and a kill command can never act on
//! the same stale `active` flag.

use chrono::{DateTime, Local};
use lockin_api::{
    BlockRule, LockdownStatus, UnlockProgress, API_VERSION, LOCKDOWN_RULE_ID, StopReason,
};
use lockin_host_api::{RuleSink, Scheduler};
use lockin_store::{save_whitelist, AuditEvent, AuditEventType, SessionRecord, Store};
use lockin_util::{LockinError, Result, UnlockSecret};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    compile, expand_allowlist, expand_stored, parse_allowlist, AliasTable, CoreEvent,
    ExpandedAllowlist, Expiry, Session, UnlockAttempt,
};

/// Recurring alarm driving the authoritative expiry check
pub const CHECK_ALARM: &str = "checkTimer";

/// One-shot alarm at the session's end time
pub const END_ALARM: &str = "endLockdown";

/// Outcome of a start request
#[derive(Debug)]
pub enum StartOutcome {
    Started {
        end_time: DateTime<Local>,
        secret: UnlockSecret,
    },
    /// The end time was not in the future; nothing changed
    NotStarted,
}

/// Outcome of a stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotActive,
}

/// Outcome of an expiry check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Idle,
    StillActive { remaining: Duration },
    Stopped,
}

/// What `recover` found at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverOutcome {
    /// No record existed; the initial one was written
    Installed,
    Idle,
    Resumed { end_time: DateTime<Local> },
    Expired,
}

struct EngineState {
    attempt: UnlockAttempt,
    pending_events: Vec<CoreEvent>,
}

/// The lockdown state machine
pub struct LockdownEngine {
    store: Arc<dyn Store>,
    rule_sink: Arc<dyn RuleSink>,
    scheduler: Arc<dyn Scheduler>,
    aliases: AliasTable,
    check_interval: Duration,
    initial_allowlist: Vec<String>,
    state: Mutex<EngineState>,
}

impl LockdownEngine {
    pub fn new(
        store: Arc<dyn Store>,
        rule_sink: Arc<dyn RuleSink>,
        scheduler: Arc<dyn Scheduler>,
        aliases: AliasTable,
        check_interval: Duration,
    ) -> Self {
        info!(
            alias_classes = aliases.class_count(),
            check_interval_secs = check_interval.as_secs(),
            "Lockdown engine initialized"
        );

        Self {
            store,
            rule_sink,
            scheduler,
            aliases,
            check_interval,
            initial_allowlist: Vec::new(),
            state: Mutex::new(EngineState {
                attempt: UnlockAttempt::new(),
                pending_events: Vec::new(),
            }),
        }
    }

    /// Allow-list written into the record on first install
    pub fn with_initial_allowlist(mut self, allowlist: Vec<String>) -> Self {
        self.initial_allowlist = allowlist;
        self
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Restore state after a (re)start
    pub async fn recover(&self, now: DateTime<Local>) -> Result<RecoverOutcome> {
        let mut state = self.state.lock().await;

        let outcome = match self.load_record()? {
            None => {
                let session = Session::idle(self.initial_allowlist.clone());
                self.save(&session)?;
                self.audit(AuditEventType::RecordInstalled);
                info!(entries = session.allowlist.len(), "Session record installed");
                self.clear_stale_rule().await;
                RecoverOutcome::Installed
            }
            Some(session) => {
                state.attempt.bind(&session.secret);
                match session.expiry(&now) {
                    Expiry::Idle => {
                        self.clear_stale_rule().await;
                        RecoverOutcome::Idle
                    }
                    Expiry::Due => {
                        info!("Lockdown expired while the service was down");
                        self.stop_locked(&mut state, session, StopReason::Expired)
                            .await?;
                        RecoverOutcome::Expired
                    }
                    Expiry::Running { remaining } => {
                        let end_time = session.end_time.unwrap_or(now);
                        self.install_rule(self.rule_for(&session.allowlist)).await?;
                        self.schedule_end(end_time).await;
                        self.audit(AuditEventType::LockdownRecovered { end_time });
                        state
                            .pending_events
                            .push(CoreEvent::LockdownResumed { end_time });
                        info!(
                            end_time = %end_time,
                            remaining_secs = remaining.as_secs(),
                            "Lockdown resumed"
                        );
                        RecoverOutcome::Resumed { end_time }
                    }
                }
            }
        };

        self.ensure_check_alarm().await;
        Ok(outcome)
    }

    /// Start a lockdown lasting `minutes`
    pub async fn start_for(
        &self,
        minutes: i64,
        allowlist: Vec<String>,
        now: DateTime<Local>,
    ) -> Result<StartOutcome> {
        let end_time = lockin_util::lockdown_length(minutes)
            .and_then(|length| now.checked_add_signed(length))
            .ok_or(LockinError::InvalidDuration(minutes))?;
        self.start_until(end_time, allowlist, now).await
    }

    /// Start a lockdown ending at `end_time`
    pub async fn start_until(
        &self,
        end_time: DateTime<Local>,
        allowlist: Vec<String>,
        now: DateTime<Local>,
    ) -> Result<StartOutcome> {
        let domains =
            parse_allowlist(&allowlist).map_err(|e| LockinError::InvalidDomain(e.to_string()))?;

        let end_ms = lockin_util::to_epoch_millis(&end_time);
        if end_ms <= lockin_util::to_epoch_millis(&now) {
            debug!(end_time = %end_time, "End time not in the future, not starting");
            return Ok(StartOutcome::NotStarted);
        }
        // Persisted precision
        let end_time = lockin_util::from_epoch_millis(end_ms).unwrap_or(end_time);

        let mut state = self.state.lock().await;

        let current = self.load_or_initial()?;
        if current.active {
            return Err(LockinError::LockdownAlreadyActive);
        }

        let expanded = expand_allowlist(&self.aliases, &domains);
        self.install_rule(compile(&expanded)).await?;

        let secret = UnlockSecret::generate();
        let session = Session::started(allowlist, end_time, secret.clone());
        if let Err(e) = self.save(&session) {
            if let Err(undo) = self.remove_rule().await {
                error!(error = %undo, "Failed to remove rule after store failure");
            }
            return Err(e);
        }

        state.attempt.bind(&secret);

        self.schedule_end(end_time).await;
        self.ensure_check_alarm().await;

        self.audit(AuditEventType::LockdownStarted {
            end_time,
            allowlist_len: session.allowlist.len(),
            expanded_len: expanded.len(),
        });
        info!(
            end_time = %end_time,
            entries = session.allowlist.len(),
            allowed_hosts = expanded.len(),
            "Lockdown started"
        );
        state.pending_events.push(CoreEvent::LockdownStarted {
            end_time,
            allowlist: session.allowlist,
            expanded,
        });

        Ok(StartOutcome::Started { end_time, secret })
    }

    /// Expiry check; the authoritative path to ending a lockdown on time
    pub async fn tick(&self, now: DateTime<Local>) -> Result<CheckOutcome> {
        let mut state = self.state.lock().await;

        let Some(session) = self.load_record()? else {
            return Ok(CheckOutcome::Idle);
        };

        match session.expiry(&now) {
            Expiry::Idle => Ok(CheckOutcome::Idle),
            Expiry::Running { remaining } => {
                debug!(remaining_secs = remaining.as_secs(), "Lockdown still active");
                Ok(CheckOutcome::StillActive { remaining })
            }
            Expiry::Due => {
                self.stop_locked(&mut state, session, StopReason::Expired)
                    .await?;
                Ok(CheckOutcome::Stopped)
            }
        }
    }

    /// Terminal alarm: stop unconditionally
    pub async fn expire(&self) -> Result<StopOutcome> {
        self.stop(StopReason::Expired).await
    }

    /// End the lockdown now
    pub async fn stop(&self, reason: StopReason) -> Result<StopOutcome> {
        let mut state = self.state.lock().await;
        match self.load_record()? {
            Some(session) if session.active => {
                self.stop_locked(&mut state, session, reason).await?;
                Ok(StopOutcome::Stopped)
            }
            _ => {
                debug!(reason = ?reason, "Stop requested with no active lockdown");
                Ok(StopOutcome::NotActive)
            }
        }
    }

    /// Route a fired alarm; unknown names are ignored
    pub async fn on_alarm(&self, name: &str, now: DateTime<Local>) -> Result<Option<CheckOutcome>> {
        match name {
            CHECK_ALARM => self.tick(now).await.map(Some),
            END_ALARM => {
                let outcome = match self.expire().await? {
                    StopOutcome::Stopped => CheckOutcome::Stopped,
                    StopOutcome::NotActive => CheckOutcome::Idle,
                };
                Ok(Some(outcome))
            }
            other => {
                debug!(alarm = other, "Ignoring unknown alarm");
                Ok(None)
            }
        }
    }

    /// Feed the next unlock candidate; a complete match stops the lockdown
    pub async fn submit_unlock(&self, candidate: &str) -> Result<UnlockProgress> {
        let mut state = self.state.lock().await;

        let session = self.load_or_initial()?;
        let secret = if session.active {
            session.secret.clone()
        } else {
            UnlockSecret::empty()
        };

        let progress = state.attempt.submit(candidate, &secret);
        if progress.complete {
            info!("Unlock secret entered");
            self.stop_locked(&mut state, session, StopReason::Unlocked)
                .await?;
        }

        Ok(progress)
    }

    /// The active session's secret, if any
    pub async fn reveal_secret(&self) -> Result<Option<UnlockSecret>> {
        let _state = self.state.lock().await;
        let session = self.load_or_initial()?;
        Ok((session.active && !session.secret.is_empty()).then_some(session.secret))
    }

    /// Replace the stored allow-list; refused while a lockdown is active
    pub async fn set_allowlist(&self, allowlist: Vec<String>) -> Result<Vec<String>> {
        parse_allowlist(&allowlist).map_err(|e| LockinError::InvalidDomain(e.to_string()))?;

        let mut state = self.state.lock().await;
        if self.load_or_initial()?.active {
            return Err(LockinError::LockdownAlreadyActive);
        }

        save_whitelist(self.store.as_ref(), &allowlist)
            .map_err(|e| LockinError::store(e.to_string()))?;

        self.audit(AuditEventType::AllowlistUpdated {
            entries: allowlist.len(),
        });
        info!(entries = allowlist.len(), "Allow-list updated");
        state.pending_events.push(CoreEvent::AllowlistUpdated {
            allowlist: allowlist.clone(),
        });

        Ok(allowlist)
    }

    /// Read-only snapshot; never includes the secret
    pub async fn status(&self, now: DateTime<Local>) -> Result<LockdownStatus> {
        let state = self.state.lock().await;
        let session = self.load_or_initial()?;

        let unlock = if session.active {
            state.attempt.progress(&session.secret)
        } else {
            UnlockProgress::default()
        };

        Ok(LockdownStatus {
            api_version: API_VERSION,
            state: session.state(),
            end_time: session.end_time,
            time_remaining: session.remaining(&now),
            expanded_allowlist: self.expand(&session.allowlist).into_iter().collect(),
            allowlist: session.allowlist,
            unlock,
        })
    }

    /// Take the events produced since the last call
    pub async fn drain_events(&self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.state.lock().await.pending_events)
    }

    pub fn store_healthy(&self) -> bool {
        self.store.is_healthy()
    }

    pub fn rule_sink_healthy(&self) -> bool {
        self.rule_sink.is_healthy()
    }

    async fn stop_locked(
        &self,
        state: &mut EngineState,
        session: Session,
        reason: StopReason,
    ) -> Result<()> {
        self.remove_rule().await?;

        if let Err(e) = self.save(&session.stopped()) {
            if let Err(undo) = self.install_rule(self.rule_for(&session.allowlist)).await {
                error!(error = %undo, "Failed to reinstall rule after store failure");
            }
            return Err(e);
        }

        state.attempt.reset();

        if let Err(e) = self.scheduler.cancel(END_ALARM).await {
            warn!(error = %e, "Failed to cancel end alarm");
        }

        self.audit(AuditEventType::LockdownEnded { reason });
        info!(reason = ?reason, "Lockdown ended");
        state.pending_events.push(CoreEvent::LockdownEnded { reason });

        Ok(())
    }

    fn expand(&self, allowlist: &[String]) -> ExpandedAllowlist {
        expand_stored(&self.aliases, allowlist)
    }

    fn rule_for(&self, allowlist: &[String]) -> BlockRule {
        compile(&self.expand(allowlist))
    }

    async fn install_rule(&self, rule: BlockRule) -> Result<()> {
        self.rule_sink
            .update_rules(&[LOCKDOWN_RULE_ID], vec![rule])
            .await
            .map_err(|e| LockinError::rule_sink(e.to_string()))
    }

    async fn remove_rule(&self) -> Result<()> {
        self.rule_sink
            .update_rules(&[LOCKDOWN_RULE_ID], Vec::new())
            .await
            .map_err(|e| LockinError::rule_sink(e.to_string()))
    }

    async fn clear_stale_rule(&self) {
        if let Err(e) = self.remove_rule().await {
            warn!(error = %e, "Failed to clear stale lockdown rule");
        }
    }

    async fn schedule_end(&self, end_time: DateTime<Local>) {
        if let Err(e) = self.scheduler.schedule_at(END_ALARM, end_time).await {
            warn!(error = %e, "Failed to schedule end alarm");
        }
    }

    async fn ensure_check_alarm(&self) {
        if let Err(e) = self
            .scheduler
            .schedule_recurring(CHECK_ALARM, self.check_interval)
            .await
        {
            warn!(error = %e, "Failed to schedule recurring check");
        }
    }

    fn load_record(&self) -> Result<Option<Session>> {
        SessionRecord::load(self.store.as_ref())
            .map(|r| r.as_ref().map(Session::from_record))
            .map_err(|e| LockinError::store(e.to_string()))
    }

    fn load_or_initial(&self) -> Result<Session> {
        Ok(self
            .load_record()?
            .unwrap_or_else(|| Session::idle(Vec::new())))
    }

    fn save(&self, session: &Session) -> Result<()> {
        session
            .to_record()
            .save(self.store.as_ref())
            .map_err(|e| LockinError::store(e.to_string()))
    }

    fn audit(&self, event: AuditEventType) {
        if let Err(e) = self.store.append_audit(AuditEvent::new(event)) {
            warn!(error = %e, "Failed to append audit event");
        }
    }
}
