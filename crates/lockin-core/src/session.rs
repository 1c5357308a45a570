//! Session model
//!
//! A `Session` is the in-memory view of the persisted record. Transitions
//! produce a new value; writing it back is left to the engine.

use chrono::{DateTime, Local};
use lockin_api::LockdownState;
use lockin_store::SessionRecord;
use lockin_util::{from_epoch_millis, remaining_until, to_epoch_millis, UnlockSecret};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub active: bool,
    pub end_time: Option<DateTime<Local>>,
    /// Raw entries as the user gave them
    pub allowlist: Vec<String>,
    pub secret: UnlockSecret,
}

/// Where an active session stands relative to its end time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Not active
    Idle,
    /// Active and not yet due
    Running { remaining: Duration },
    /// Active and at or past its end time
    Due,
}

impl Session {
    /// Inactive session holding `allowlist`
    pub fn idle(allowlist: Vec<String>) -> Self {
        Self {
            active: false,
            end_time: None,
            allowlist,
            secret: UnlockSecret::empty(),
        }
    }

    pub fn started(allowlist: Vec<String>, end_time: DateTime<Local>, secret: UnlockSecret) -> Self {
        Self {
            active: true,
            end_time: Some(end_time),
            allowlist,
            secret,
        }
    }

    /// The stopped form: end time and secret cleared, allow-list kept
    pub fn stopped(&self) -> Self {
        Self::idle(self.allowlist.clone())
    }

    pub fn from_record(record: &SessionRecord) -> Self {
        Self {
            active: record.is_active,
            end_time: record.end_time.and_then(from_epoch_millis),
            allowlist: record.whitelist.clone(),
            secret: UnlockSecret::from_string(record.kill_switch_uuid.clone()),
        }
    }

    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            whitelist: self.allowlist.clone(),
            is_active: self.active,
            end_time: self.end_time.as_ref().map(to_epoch_millis),
            kill_switch_uuid: self.secret.as_str().to_string(),
        }
    }

    pub fn state(&self) -> LockdownState {
        if self.active {
            LockdownState::Active
        } else {
            LockdownState::Idle
        }
    }

    /// Compare against `now` at millisecond precision
    ///
    /// An active session without an end time can never be checked against
    /// the clock and is treated as due.
    pub fn expiry(&self, now: &DateTime<Local>) -> Expiry {
        if !self.active {
            return Expiry::Idle;
        }
        match &self.end_time {
            Some(end) if to_epoch_millis(now) < to_epoch_millis(end) => Expiry::Running {
                remaining: remaining_until(end, now),
            },
            _ => Expiry::Due,
        }
    }

    pub fn remaining(&self, now: &DateTime<Local>) -> Duration {
        match self.expiry(now) {
            Expiry::Running { remaining } => remaining,
            _ => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: i64 = 1_700_000_000_000;

    fn at(ms: i64) -> DateTime<Local> {
        from_epoch_millis(ms).unwrap()
    }

    #[test]
    fn record_round_trip_keeps_millis() {
        let session = Session::started(
            vec!["github.com".into()],
            at(T + 60_000),
            UnlockSecret::from_string("abcd-1234"),
        );
        let record = session.to_record();

        assert_eq!(record.end_time, Some(T + 60_000));
        assert_eq!(record.kill_switch_uuid, "abcd-1234");
        assert_eq!(Session::from_record(&record), session);
    }

    #[test]
    fn stopped_clears_secret_and_end_time() {
        let session = Session::started(
            vec!["github.com".into()],
            at(T),
            UnlockSecret::from_string("abcd-1234"),
        );
        let stopped = session.stopped();

        assert!(!stopped.active);
        assert!(stopped.end_time.is_none());
        assert!(stopped.secret.is_empty());
        assert_eq!(stopped.allowlist, session.allowlist);
    }

    #[test]
    fn expiry_boundary() {
        let session = Session::started(vec![], at(T + 1_800_000), UnlockSecret::generate());

        assert_eq!(
            session.expiry(&at(T + 1_800_000 - 1)),
            Expiry::Running {
                remaining: Duration::from_millis(1)
            }
        );
        assert_eq!(session.expiry(&at(T + 1_800_000)), Expiry::Due);
        assert_eq!(session.expiry(&at(T + 1_900_000)), Expiry::Due);
    }

    #[test]
    fn idle_and_corrupt_sessions() {
        assert_eq!(Session::idle(vec![]).expiry(&at(T)), Expiry::Idle);

        let mut broken = Session::idle(vec![]);
        broken.active = true;
        assert_eq!(broken.expiry(&at(T)), Expiry::Due);
    }
}
