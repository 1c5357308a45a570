//! Mock collaborators for testing

use async_trait::async_trait;
use chrono::{DateTime, Local};
use lockin_api::{BlockRule, RuleId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::{Alarm, HostError, HostResult, RuleSink, Scheduler};

/// One recorded `update_rules` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleUpdate {
    pub remove_ids: Vec<RuleId>,
    pub add_rules: Vec<BlockRule>,
}

/// In-memory rule sink that records every update
#[derive(Default)]
pub struct MockRuleSink {
    rules: Mutex<Vec<BlockRule>>,
    updates: Mutex<Vec<RuleUpdate>>,

    /// Configure updates to fail
    pub fail_update: Arc<Mutex<bool>>,
}

impl MockRuleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules currently installed
    pub fn installed(&self) -> Vec<BlockRule> {
        self.rules.lock().unwrap().clone()
    }

    /// Every update call so far, oldest first
    pub fn updates(&self) -> Vec<RuleUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail_update.lock().unwrap() = fail;
    }
}

#[async_trait]
impl RuleSink for MockRuleSink {
    async fn update_rules(
        &self,
        remove_ids: &[RuleId],
        add_rules: Vec<BlockRule>,
    ) -> HostResult<()> {
        if *self.fail_update.lock().unwrap() {
            return Err(HostError::RuleUpdateFailed("Mock rule sink failure".into()));
        }

        self.updates.lock().unwrap().push(RuleUpdate {
            remove_ids: remove_ids.to_vec(),
            add_rules: add_rules.clone(),
        });

        let mut rules = self.rules.lock().unwrap();
        rules.retain(|r| !remove_ids.contains(&r.id));
        rules.extend(add_rules);
        Ok(())
    }

    async fn installed_rules(&self) -> HostResult<Vec<BlockRule>> {
        Ok(self.installed())
    }

    fn is_healthy(&self) -> bool {
        !*self.fail_update.lock().unwrap()
    }
}

/// How a mock alarm was scheduled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockSchedule {
    At(DateTime<Local>),
    Every(Duration),
}

/// Scheduler that records alarms and fires them only on request
pub struct MockScheduler {
    scheduled: Mutex<HashMap<String, MockSchedule>>,
    event_tx: mpsc::UnboundedSender<Alarm>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<Alarm>>>,

    /// Configure scheduling to fail
    pub fail_schedule: Arc<Mutex<bool>>,
}

impl MockScheduler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            scheduled: Mutex::new(HashMap::new()),
            event_tx: tx,
            event_rx: Mutex::new(Some(rx)),
            fail_schedule: Arc::new(Mutex::new(false)),
        }
    }

    /// Current schedule for `name`, if any
    pub fn schedule_of(&self, name: &str) -> Option<MockSchedule> {
        self.scheduled.lock().unwrap().get(name).cloned()
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        self.scheduled.lock().unwrap().contains_key(name)
    }

    /// Simulate `name` firing. One-shot alarms are removed.
    pub fn fire(&self, name: &str) {
        let mut scheduled = self.scheduled.lock().unwrap();
        let scheduled_for = match scheduled.get(name) {
            Some(MockSchedule::At(when)) => Some(*when),
            _ => None,
        };
        if scheduled_for.is_some() {
            scheduled.remove(name);
        }
        let _ = self.event_tx.send(Alarm {
            name: name.to_string(),
            scheduled_for,
        });
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail_schedule.lock().unwrap() = fail;
    }

    fn check_fail(&self) -> HostResult<()> {
        if *self.fail_schedule.lock().unwrap() {
            return Err(HostError::ScheduleFailed("Mock scheduler failure".into()));
        }
        Ok(())
    }
}

impl Default for MockScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scheduler for MockScheduler {
    async fn schedule_at(&self, name: &str, when: DateTime<Local>) -> HostResult<()> {
        self.check_fail()?;
        self.scheduled
            .lock()
            .unwrap()
            .insert(name.to_string(), MockSchedule::At(when));
        Ok(())
    }

    async fn schedule_recurring(&self, name: &str, period: Duration) -> HostResult<()> {
        self.check_fail()?;
        self.scheduled
            .lock()
            .unwrap()
            .insert(name.to_string(), MockSchedule::Every(period));
        Ok(())
    }

    async fn cancel(&self, name: &str) -> HostResult<bool> {
        self.check_fail()?;
        Ok(self.scheduled.lock().unwrap().remove(name).is_some())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<Alarm> {
        self.event_rx
            .lock()
            .unwrap()
            .take()
            .expect("subscribe() can only be called once")
    }
}
