//! Alarm scheduler backed by tokio timers

use async_trait::async_trait;
use chrono::{DateTime, Local};
use lockin_host_api::{Alarm, HostError, HostResult, Scheduler};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Scheduler running one tokio task per named alarm
///
/// Must be used from within a tokio runtime.
pub struct TokioScheduler {
    tasks: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
    event_tx: mpsc::UnboundedSender<Alarm>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<Alarm>>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tasks: Arc::new(Mutex::new(HashMap::new())),
            event_tx: tx,
            event_rx: Mutex::new(Some(rx)),
        }
    }

    fn replace(&self, name: &str, handle: JoinHandle<()>) -> HostResult<()> {
        let mut tasks = self
            .tasks
            .lock()
            .map_err(|_| HostError::Internal("scheduler lock poisoned".into()))?;
        if let Some(old) = tasks.insert(name.to_string(), handle) {
            old.abort();
        }
        Ok(())
    }

    /// Names of alarms that have not fired or been cancelled yet
    pub fn pending(&self) -> Vec<String> {
        match self.tasks.lock() {
            Ok(tasks) => tasks
                .iter()
                .filter(|(_, h)| !h.is_finished())
                .map(|(name, _)| name.clone())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        if let Ok(tasks) = self.tasks.lock() {
            for handle in tasks.values() {
                handle.abort();
            }
        }
    }
}

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn schedule_at(&self, name: &str, when: DateTime<Local>) -> HostResult<()> {
        let delay = lockin_util::remaining_until(&when, &lockin_util::now());
        let tx = self.event_tx.clone();
        let alarm = Alarm {
            name: name.to_string(),
            scheduled_for: Some(when),
        };

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(alarm = %alarm.name, "Alarm fired");
            let _ = tx.send(alarm);
        });

        self.replace(name, handle)?;
        info!(alarm = name, when = %when, delay_secs = delay.as_secs(), "Alarm scheduled");
        Ok(())
    }

    async fn schedule_recurring(&self, name: &str, period: Duration) -> HostResult<()> {
        if period.is_zero() {
            return Err(HostError::ScheduleFailed(format!(
                "recurring alarm '{}' needs a non-zero period",
                name
            )));
        }

        let tx = self.event_tx.clone();
        let alarm_name = name.to_string();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(Alarm::new(alarm_name.clone())).is_err() {
                    break;
                }
            }
        });

        self.replace(name, handle)?;
        info!(alarm = name, period_secs = period.as_secs(), "Recurring alarm scheduled");
        Ok(())
    }

    async fn cancel(&self, name: &str) -> HostResult<bool> {
        let mut tasks = self
            .tasks
            .lock()
            .map_err(|_| HostError::Internal("scheduler lock poisoned".into()))?;

        match tasks.remove(name) {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                debug!(alarm = name, was_pending, "Alarm cancelled");
                Ok(was_pending)
            }
            None => Ok(false),
        }
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<Alarm> {
        self.event_rx
            .lock()
            .unwrap()
            .take()
            .expect("subscribe() can only be called once")
    }
}
