//! Password-reset repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use gatehouse_core::error::{AppError, ErrorKind};
use gatehouse_core::result::AppResult;
use gatehouse_entity::reset::PasswordResetRequest;

use crate::stores::PasswordResetStore;

/// Repository for password-reset grants.
#[derive(Debug, Clone)]
pub struct PasswordResetRepository {
    pool: PgPool,
}

impl PasswordResetRepository {
    /// Create a new password-reset repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PasswordResetStore for PasswordResetRepository {
    async fn create(&self, request: &PasswordResetRequest) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO password_resets (id, user_id, token_hash, is_used, created_at, \
             expires_at, used_at, ip_address, user_agent) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(request.id)
        .bind(request.user_id)
        .bind(&request.token_hash)
        .bind(request.is_used)
        .bind(request.created_at)
        .bind(request.expires_at)
        .bind(request.used_at)
        .bind(&request.ip_address)
        .bind(&request.user_agent)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create reset request", e)
        })?;
        Ok(())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<PasswordResetRequest>> {
        sqlx::query_as::<_, PasswordResetRequest>(
            "SELECT * FROM password_resets WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find reset request", e)
        })
    }

    async fn consume(
        &self,
        request_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        // Guards against a raced double redemption: only one caller can flip
        // is_used.
        let result = sqlx::query(
            "UPDATE password_resets SET is_used = TRUE, used_at = $2 \
             WHERE id = $1 AND is_used = FALSE",
        )
        .bind(request_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to redeem reset request", e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict("Password reset request already used"));
        }

        sqlx::query(
            "UPDATE users SET password_hash = $2, password_changed_at = $3, updated_at = $3 \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update password", e))?;

        sqlx::query("UPDATE user_sessions SET is_active = FALSE WHERE user_id = $1 AND is_active")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to revoke sessions", e)
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })
    }

    async fn purge_stale(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM password_resets WHERE is_used OR expires_at < $1")
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to purge reset requests", e)
                })?;

        Ok(result.rows_affected())
    }
}
