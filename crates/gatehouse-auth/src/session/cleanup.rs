//! Expired-session sweep and purge of old inactive rows.

use std::sync::Arc;

use chrono::Duration;
use tracing::info;

use gatehouse_core::config::session::SessionConfig;
use gatehouse_core::error::AppError;
use gatehouse_core::traits::Clock;
use gatehouse_database::stores::SessionStore;

/// Handles the periodic session maintenance cycle.
#[derive(Clone)]
pub struct SessionCleanup {
    /// Session persistence.
    sessions: Arc<dyn SessionStore>,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// How long inactive rows are kept before physical deletion.
    retention: Duration,
}

impl std::fmt::Debug for SessionCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCleanup")
            .field("retention", &self.retention)
            .finish()
    }
}

impl SessionCleanup {
    /// Creates a new session cleanup handler.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            sessions,
            clock,
            retention: Duration::days(config.purge_retention_days as i64),
        }
    }

    /// Runs one maintenance cycle: deactivates sessions past expiry, then
    /// deletes inactive rows older than the retention window.
    ///
    /// Returns `(deactivated, purged)`.
    pub async fn run(&self) -> Result<(u64, u64), AppError> {
        let now = self.clock.now();

        let deactivated = self.sessions.deactivate_expired(now).await?;
        let purged = self.sessions.purge_inactive(now - self.retention).await?;

        if deactivated > 0 || purged > 0 {
            info!(deactivated, purged, "Session cleanup completed");
        }

        Ok((deactivated, purged))
    }
}
