//! Request context carrying the authenticated caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gatehouse_auth::token::Claims;
use gatehouse_core::error::AppError;
use gatehouse_core::types::RequestMeta;
use gatehouse_entity::user::Role;

/// Context for the current authenticated request.
///
/// Built from verified access-token claims by the transport layer and
/// passed into service methods so that every operation knows *who* is
/// acting and from *which* session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's id.
    pub user_id: Uuid,
    /// The session the access token belongs to.
    pub session_id: Uuid,
    /// The user's role at token issuance.
    pub role: Role,
    /// The user's email at token issuance.
    pub email: String,
    /// Request metadata for sessions and audit entries.
    pub meta: RequestMeta,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Builds a context from verified access-token claims.
    pub fn from_claims(
        claims: &Claims,
        meta: RequestMeta,
        request_time: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let session_id = claims
            .session_id
            .ok_or_else(|| AppError::invalid_token("Access token is missing its session id"))?;
        let role = claims
            .role
            .ok_or_else(|| AppError::invalid_token("Access token is missing its role"))?;
        let email = claims
            .email
            .clone()
            .ok_or_else(|| AppError::invalid_token("Access token is missing its email"))?;

        Ok(Self {
            user_id: claims.user_id()?,
            session_id,
            role,
            email,
            meta,
            request_time,
        })
    }
}
