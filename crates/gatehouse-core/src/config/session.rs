//! Session lifecycle configuration.

use serde::{Deserialize, Serialize};

/// Session retention configuration.
///
/// Token TTLs live in [`super::auth::AuthConfig`]; this section only
/// controls how long revoked and expired session rows are kept before the
/// maintenance sweep physically deletes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Days to keep inactive (revoked or expired) session rows before purge.
    #[serde(default = "default_purge_retention")]
    pub purge_retention_days: u64,
}

fn default_purge_retention() -> u64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            purge_retention_days: default_purge_retention(),
        }
    }
}
