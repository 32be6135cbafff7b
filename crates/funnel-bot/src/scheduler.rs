//! Scheduled sweeps
//!
//! Cron jobs declared in business-local time and converted to UTC through
//! [`SchedulerConfig::cron`](funnel_common::SchedulerConfig::cron). Every job
//! runs on its own; a failing sweep is logged and the others carry on.

use std::sync::Arc;

use chrono::Weekday;
use funnel_common::SchedulerConfig;
use funnel_service::{EffectRunner, ServiceContext, SweepService};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

/// The recurring jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepJob {
    /// Expiry warnings, then the bulk expiry
    Expiry,
    RenewalReminders,
    SessionPurge,
    WeeklyStats,
}

impl SweepJob {
    pub const ALL: [Self; 4] = [
        Self::Expiry,
        Self::RenewalReminders,
        Self::SessionPurge,
        Self::WeeklyStats,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Expiry => "expiry",
            Self::RenewalReminders => "renewal_reminders",
            Self::SessionPurge => "session_purge",
            Self::WeeklyStats => "weekly_stats",
        }
    }

    /// Local hour and optional weekday
    pub fn local_time(self) -> (u32, Option<Weekday>) {
        match self {
            Self::Expiry => (9, None),
            Self::RenewalReminders => (10, None),
            Self::SessionPurge => (18, None),
            Self::WeeklyStats => (10, Some(Weekday::Sun)),
        }
    }

    pub fn cron(self, config: &SchedulerConfig) -> String {
        let (hour, weekday) = self.local_time();
        config.cron(hour, weekday)
    }

    /// Run the sweep once and deliver what it produced
    pub async fn run(self, ctx: &ServiceContext, runner: &EffectRunner) {
        let sweeps = SweepService::new(ctx);
        let now = ctx.now();

        let reports = match self {
            Self::Expiry => vec![
                sweeps.expiring_soon(now).await,
                sweeps.expire_overdue(now).await,
            ],
            Self::RenewalReminders => vec![sweeps.renewal_reminders(now).await],
            Self::SessionPurge => vec![sweeps.purge_sessions(now).await],
            Self::WeeklyStats => vec![sweeps.weekly_stats(now).await],
        };

        for report in reports {
            match report {
                Ok(report) => {
                    info!(job = self.name(), processed = report.processed, "Sweep finished");
                    runner.run_all(report.effects).await;
                }
                Err(e) => error!(job = self.name(), error = %e, "Sweep failed"),
            }
        }
    }
}

/// Register every sweep and start the scheduler
pub async fn start(
    config: &SchedulerConfig,
    ctx: Arc<ServiceContext>,
    runner: EffectRunner,
) -> Result<JobScheduler, SchedulerError> {
    let scheduler = JobScheduler::new().await?;

    for sweep in SweepJob::ALL {
        let schedule = sweep.cron(config);
        let ctx = Arc::clone(&ctx);
        let runner = runner.clone();

        let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
            let ctx = Arc::clone(&ctx);
            let runner = runner.clone();
            Box::pin(async move {
                info!(job = sweep.name(), "Running scheduled sweep");
                sweep.run(&ctx, &runner).await;
            })
        })?;
        scheduler.add(job).await?;
        info!(job = sweep.name(), cron = %schedule, "Sweep scheduled");
    }

    scheduler.start().await?;
    info!("Scheduler started");
    Ok(scheduler)
}
