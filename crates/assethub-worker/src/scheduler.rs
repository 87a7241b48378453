//! Cron scheduler for periodic maintenance tasks.

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{debug, error, info};

use assethub_core::config::WorkerConfig;
use assethub_core::error::AppError;

use crate::jobs::IntentSweepJob;

/// Cron-based scheduler for periodic background tasks.
pub struct CronScheduler {
    /// The underlying job scheduler.
    scheduler: JobScheduler,
    /// Schedules and switches.
    config: WorkerConfig,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("config", &self.config)
            .finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new(config: WorkerConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;
        Ok(Self { scheduler, config })
    }

    /// Register the intent sweep on its configured schedule.
    pub async fn register_intent_sweep(&self, job: IntentSweepJob) -> Result<(), AppError> {
        let schedule = self.config.intent_sweep_cron.clone();
        let cron = CronJob::new_async(schedule.as_str(), move |_uuid, _lock| {
            let job = job.clone();
            Box::pin(async move {
                debug!("Running scheduled intent sweep");
                if let Err(e) = job.run().await {
                    error!(error = %e, "Intent sweep failed");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid intent sweep schedule '{schedule}': {e}"
            ))
        })?;

        self.scheduler
            .add(cron)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add intent sweep schedule: {e}")))?;

        info!(schedule = %schedule, "Registered: intent_sweep");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;
        info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;
        info!("Cron scheduler shut down");
        Ok(())
    }
}
