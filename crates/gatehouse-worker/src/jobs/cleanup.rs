//! Session and reset-request cleanup jobs.

use std::sync::Arc;

use tracing::{error, info};

use gatehouse_auth::session::SessionCleanup;
use gatehouse_core::error::AppError;
use gatehouse_core::traits::Clock;
use gatehouse_database::stores::PasswordResetStore;

/// The maintenance job bodies invoked by the scheduler.
#[derive(Clone)]
pub struct MaintenanceJobs {
    /// Session sweep and purge.
    session_cleanup: SessionCleanup,
    /// Reset-request persistence.
    resets: Arc<dyn PasswordResetStore>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for MaintenanceJobs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceJobs").finish()
    }
}

impl MaintenanceJobs {
    /// Creates the maintenance job set.
    pub fn new(
        session_cleanup: SessionCleanup,
        resets: Arc<dyn PasswordResetStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session_cleanup,
            resets,
            clock,
        }
    }

    /// Runs the expired-session sweep. Idempotent and safe to run
    /// concurrently with live traffic.
    pub async fn run_session_sweep(&self) {
        match self.session_cleanup.run().await {
            Ok((deactivated, purged)) => {
                if deactivated > 0 || purged > 0 {
                    info!(deactivated, purged, "Session sweep finished");
                }
            }
            Err(e) => error!(error = %e, "Session sweep failed"),
        }
    }

    /// Deletes redeemed and expired password-reset requests.
    pub async fn run_reset_purge(&self) {
        match self.resets.purge_stale(self.clock.now()).await {
            Ok(purged) => {
                if purged > 0 {
                    info!(purged, "Stale password-reset requests purged");
                }
            }
            Err(e) => error!(error = %e, "Reset purge failed"),
        }
    }

    /// Runs every job once. Used by the scheduler on startup so a long
    /// downtime does not wait for the next cron tick.
    pub async fn run_all(&self) -> Result<(), AppError> {
        self.run_session_sweep().await;
        self.run_reset_purge().await;
        Ok(())
    }
}
