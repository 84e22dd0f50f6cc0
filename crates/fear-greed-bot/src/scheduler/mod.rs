//! Daily push scheduler
//!
//! Each [`PushJob`] runs in its own task: compute the next fire time from its
//! cron expression in the configured timezone, sleep until then, push the
//! combined report to the recipient, repeat. Failures are logged and the job
//! waits for its next slot.

pub mod cron;

use crate::bot::FearGreedBot;
use crate::config::BotConfig;
use crate::interface::{ChatId, PushTime};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub use cron::{CronError, CronSchedule};

/// Source of the current wall-clock time
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A named recurring push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushJob {
    /// Name used in logs, e.g. "morning"
    pub name: String,
    /// Label shown to users, e.g. "早间"
    pub label: String,
    pub schedule: CronSchedule,
}

impl PushJob {
    pub fn new(name: impl Into<String>, label: impl Into<String>, schedule: CronSchedule) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            schedule,
        }
    }

    pub fn push_time(&self) -> PushTime {
        PushTime {
            label: self.label.clone(),
            time: self.schedule.describe(),
        }
    }
}

pub struct Scheduler {
    timezone: Tz,
    jobs: Vec<PushJob>,
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn new(timezone: Tz, jobs: Vec<PushJob>) -> Self {
        Self {
            timezone,
            jobs,
            clock: Arc::new(SystemClock),
        }
    }

    /// Morning and evening jobs from the configuration
    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(config.timezone, config.push_jobs())
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn jobs(&self) -> &[PushJob] {
        &self.jobs
    }

    /// Next fire time of `job` strictly after `after`
    pub fn next_fire(&self, job: &PushJob, after: DateTime<Utc>) -> Option<DateTime<Tz>> {
        job.schedule.next_after(&after.with_timezone(&self.timezone))
    }

    /// Sleep until the job's next slot after `after` and push once.
    ///
    /// Returns the slot that fired, or `None` if the expression never matches.
    pub async fn fire_next(
        &self,
        job: &PushJob,
        after: DateTime<Utc>,
        bot: &FearGreedBot,
        recipient: ChatId,
    ) -> Option<DateTime<Tz>> {
        let next = self.next_fire(job, after)?;
        let wait = (next.with_timezone(&Utc) - self.clock.now())
            .to_std()
            .unwrap_or_default();

        info!(job = %job.name, next = %next, "Next push scheduled");
        tokio::time::sleep(wait).await;

        info!(job = %job.name, %recipient, "Scheduled push firing");
        match bot.push_combined(recipient).await {
            Ok(outcome) if outcome.is_sent() => {}
            Ok(_) => warn!(job = %job.name, "Scheduled push skipped after fetch failure"),
            Err(e) => error!(job = %job.name, error = %e, "Scheduled push could not be delivered"),
        }

        Some(next)
    }

    /// Run one job forever
    async fn run_job(self: Arc<Self>, job: PushJob, bot: Arc<FearGreedBot>, recipient: ChatId) {
        let mut after = self.clock.now();
        loop {
            let Some(fired) = self.fire_next(&job, after, &bot, recipient).await else {
                warn!(job = %job.name, schedule = %job.schedule, "Schedule never fires; stopping job");
                return;
            };
            // Never fire the same slot twice, even if the wall clock lags the timer
            after = self.clock.now().max(fired.with_timezone(&Utc));
        }
    }

    /// Spawn one task per job
    pub fn spawn(self, bot: Arc<FearGreedBot>, recipient: ChatId) -> Vec<JoinHandle<()>> {
        let scheduler = Arc::new(self);
        scheduler
            .jobs
            .iter()
            .cloned()
            .map(|job| {
                info!(job = %job.name, schedule = %job.schedule, timezone = %scheduler.timezone, "Registering push job");
                tokio::spawn(Arc::clone(&scheduler).run_job(job, Arc::clone(&bot), recipient))
            })
            .collect()
    }
}
