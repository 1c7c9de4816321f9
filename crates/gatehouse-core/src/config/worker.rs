//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background maintenance worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the maintenance scheduler runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron schedule for the expired-session sweep.
    #[serde(default = "default_session_sweep")]
    pub session_sweep_schedule: String,
    /// Cron schedule for the stale password-reset purge.
    #[serde(default = "default_reset_purge")]
    pub reset_purge_schedule: String,
}

fn default_true() -> bool {
    true
}

fn default_session_sweep() -> String {
    // Every 15 minutes
    "0 */15 * * * *".to_string()
}

fn default_reset_purge() -> String {
    // Every hour
    "0 0 * * * *".to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            session_sweep_schedule: default_session_sweep(),
            reset_purge_schedule: default_reset_purge(),
        }
    }
}
