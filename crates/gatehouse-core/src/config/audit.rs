//! Audit trail configuration.

use serde::{Deserialize, Serialize};

/// Audit trail configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit recording is enabled at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// When true, a failed audit write aborts the triggering operation.
    /// When false, the failure is logged and swallowed.
    #[serde(default)]
    pub mandatory: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mandatory: false,
        }
    }
}
