//! Request metadata captured by the transport layer.

use serde::{Deserialize, Serialize};

/// Metadata about the inbound request that triggered an operation.
///
/// Populated by whatever transport wraps this core (HTTP middleware, test
/// harness) and threaded through to sessions and audit entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestMeta {
    /// Client IP address, if known.
    pub ip_address: Option<String>,
    /// User-Agent header value, if present.
    pub user_agent: Option<String>,
    /// Free-form device description supplied by the client.
    pub device_info: Option<String>,
}

impl RequestMeta {
    /// Metadata for an operation with no originating request (system action).
    pub fn system() -> Self {
        Self::default()
    }
}
