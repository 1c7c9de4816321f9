//! Audit trail service.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use gatehouse_auth::authz::{AccessControl, Permission};
use gatehouse_core::config::audit::AuditConfig;
use gatehouse_core::error::AppError;
use gatehouse_core::traits::Clock;
use gatehouse_core::types::RequestMeta;
use gatehouse_core::types::pagination::{PageRequest, PageResponse};
use gatehouse_database::stores::AuditStore;
use gatehouse_entity::audit::{AuditFilter, AuditLogEntry};

use crate::context::RequestContext;

/// Appends to and queries the append-only audit trail.
#[derive(Clone)]
pub struct AuditService {
    /// Audit persistence.
    store: Arc<dyn AuditStore>,
    /// Access checks for queries.
    access: AccessControl,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Whether audit is enabled and whether writes are mandatory.
    config: AuditConfig,
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService")
            .field("config", &self.config)
            .finish()
    }
}

impl AuditService {
    /// Creates a new audit service.
    pub fn new(store: Arc<dyn AuditStore>, clock: Arc<dyn Clock>, config: AuditConfig) -> Self {
        Self {
            store,
            access: AccessControl::new(),
            clock,
            config,
        }
    }

    /// Appends one audit entry.
    ///
    /// A write failure aborts the caller only when audit is configured
    /// mandatory; otherwise it is logged and swallowed so the primary
    /// operation still succeeds.
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        &self,
        actor: Option<Uuid>,
        action: &str,
        resource: Option<&str>,
        resource_id: Option<String>,
        old_values: Option<serde_json::Value>,
        new_values: Option<serde_json::Value>,
        meta: &RequestMeta,
    ) -> Result<(), AppError> {
        if !self.config.enabled {
            return Ok(());
        }

        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            user_id: actor,
            action: action.to_string(),
            resource: resource.map(String::from),
            resource_id,
            old_values,
            new_values,
            ip_address: meta.ip_address.clone(),
            user_agent: meta.user_agent.clone(),
            created_at: self.clock.now(),
        };

        match self.store.append(&entry).await {
            Ok(()) => Ok(()),
            Err(e) if self.config.mandatory => Err(e),
            Err(e) => {
                warn!(action, error = %e, "Audit write failed; continuing");
                Ok(())
            }
        }
    }

    /// Queries the audit trail, newest entries first.
    pub async fn search(
        &self,
        ctx: &RequestContext,
        filter: &AuditFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<AuditLogEntry>, AppError> {
        self.access
            .require_permission(ctx.role, Permission::ViewAuditLogs)?;

        self.store.search(filter, page).await
    }
}
