//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::info;

use gatehouse_core::config::worker::WorkerConfig;
use gatehouse_core::error::AppError;

use crate::jobs::MaintenanceJobs;

/// Cron-based scheduler for the maintenance jobs.
pub struct MaintenanceScheduler {
    /// The underlying job scheduler.
    scheduler: JobScheduler,
    /// Job bodies.
    jobs: Arc<MaintenanceJobs>,
    /// Schedules.
    config: WorkerConfig,
}

impl std::fmt::Debug for MaintenanceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceScheduler").finish()
    }
}

impl MaintenanceScheduler {
    /// Creates a new scheduler.
    pub async fn new(jobs: Arc<MaintenanceJobs>, config: WorkerConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            jobs,
            config,
        })
    }

    /// Registers the default maintenance tasks.
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        self.register_session_sweep().await?;
        self.register_reset_purge().await?;

        info!("All scheduled tasks registered");
        Ok(())
    }

    /// Starts the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        info!("Maintenance scheduler started");
        Ok(())
    }

    /// Shuts the scheduler down.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        info!("Maintenance scheduler shut down");
        Ok(())
    }

    /// Expired-session sweep on its configured schedule.
    async fn register_session_sweep(&self) -> Result<(), AppError> {
        let jobs = Arc::clone(&self.jobs);
        let job = CronJob::new_async(
            self.config.session_sweep_schedule.as_str(),
            move |_uuid, _lock| {
                let jobs = Arc::clone(&jobs);
                Box::pin(async move {
                    jobs.run_session_sweep().await;
                })
            },
        )
        .map_err(|e| {
            AppError::internal(format!("Failed to create session_sweep schedule: {e}"))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add session_sweep schedule: {e}"))
        })?;

        info!(
            schedule = %self.config.session_sweep_schedule,
            "Registered: session_sweep"
        );
        Ok(())
    }

    /// Stale reset-request purge on its configured schedule.
    async fn register_reset_purge(&self) -> Result<(), AppError> {
        let jobs = Arc::clone(&self.jobs);
        let job = CronJob::new_async(
            self.config.reset_purge_schedule.as_str(),
            move |_uuid, _lock| {
                let jobs = Arc::clone(&jobs);
                Box::pin(async move {
                    jobs.run_reset_purge().await;
                })
            },
        )
        .map_err(|e| AppError::internal(format!("Failed to create reset_purge schedule: {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add reset_purge schedule: {e}")))?;

        info!(
            schedule = %self.config.reset_purge_schedule,
            "Registered: reset_purge"
        );
        Ok(())
    }
}
