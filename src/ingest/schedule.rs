//! Daily recurring trigger built on `tokio-cron-scheduler`.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveTime, Timelike};
use tokio_cron_scheduler::{Job, JobScheduler};

/// Time of day (UTC) a daily job fires at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTime {
    hour: u32,
    minute: u32,
}

impl DailyTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Six-field cron expression (seconds first) firing once a day.
    pub fn cron_expression(&self) -> String {
        format!("0 {} {} * * *", self.minute, self.hour)
    }
}

impl FromStr for DailyTime {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let time = NaiveTime::parse_from_str(value.trim(), "%H:%M")
            .with_context(|| format!("invalid daily time '{value}', expected HH:MM"))?;
        Ok(Self {
            hour: time.hour(),
            minute: time.minute(),
        })
    }
}

impl std::fmt::Display for DailyTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02} UTC", self.hour, self.minute)
    }
}

/// Invokes an action once a day. Each invocation runs on its own task, so a
/// panicking action is logged and the schedule keeps going.
pub struct DailySchedule {
    scheduler: JobScheduler,
    at: DailyTime,
}

impl DailySchedule {
    pub async fn start<F, Fut>(at: DailyTime, action: F) -> anyhow::Result<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let scheduler = JobScheduler::new()
            .await
            .context("failed to create job scheduler")?;

        let action = Arc::new(action);
        let job = Job::new_async(at.cron_expression().as_str(), move |_uuid, _lock| {
            let action = Arc::clone(&action);
            Box::pin(async move { fire(action.as_ref()).await })
        })
        .with_context(|| format!("failed to create daily job for {at}"))?;

        scheduler
            .add(job)
            .await
            .context("failed to register daily job")?;
        scheduler
            .start()
            .await
            .context("failed to start job scheduler")?;

        tracing::info!(at = %at, "daily schedule started");
        Ok(Self { scheduler, at })
    }

    pub fn at(&self) -> DailyTime {
        self.at
    }

    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        self.scheduler
            .shutdown()
            .await
            .context("failed to shut down job scheduler")?;
        tracing::info!(at = %self.at, "daily schedule stopped");
        Ok(())
    }
}

/// One firing of the job body. A panic inside `action` is contained in its
/// task and logged; the caller always returns normally.
async fn fire<F, Fut>(action: &F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    tracing::info!("scheduled job firing");
    if let Err(err) = tokio::spawn(action()).await {
        tracing::error!(error = %err, "scheduled job aborted");
    }
}
