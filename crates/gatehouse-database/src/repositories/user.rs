//! User repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use gatehouse_core::error::{AppError, ErrorKind};
use gatehouse_core::result::AppResult;
use gatehouse_core::types::pagination::{PageRequest, PageResponse};
use gatehouse_entity::user::{LoginFailure, Role, User, UserSearchFilter, UserSortField, UserStats};

use crate::stores::UserStore;

/// Repository for user directory operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, first_name, last_name, avatar_url, \
             role, is_active, is_verified, is_locked, failed_login_attempts, locked_until, \
             last_login_at, password_changed_at, email_verified_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.avatar_url)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.is_locked)
        .bind(user.failed_login_attempts)
        .bind(user.locked_until)
        .bind(user.last_login_at)
        .bind(user.password_changed_at)
        .bind(user.email_verified_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.constraint() == Some("users_email_key") => {
                AppError::conflict("A user with this email already exists")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, first_name = $3, last_name = $4, avatar_url = $5, \
             role = $6, is_active = $7, is_verified = $8, email_verified_at = $9, \
             updated_at = $10 \
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.avatar_url)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.email_verified_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update user", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {} not found", user.id)));
        }
        Ok(())
    }

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, password_changed_at = $3, updated_at = $3 \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update password", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }

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

    async fn record_login_failure(
        &self,
        user_id: Uuid,
        threshold: i32,
        lock_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<LoginFailure> {
        // One statement so concurrent failures can never lose an increment.
        let row: Option<(i32, bool)> = sqlx::query_as(
            "UPDATE users SET \
                 failed_login_attempts = failed_login_attempts + 1, \
                 is_locked = CASE WHEN failed_login_attempts + 1 >= $2 \
                                  THEN TRUE ELSE is_locked END, \
                 locked_until = CASE WHEN failed_login_attempts + 1 >= $2 \
                                     THEN $3 ELSE locked_until END, \
                 updated_at = $4 \
             WHERE id = $1 \
             RETURNING failed_login_attempts, is_locked",
        )
        .bind(user_id)
        .bind(threshold)
        .bind(lock_until)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record login failure", e)
        })?;

        let (attempts, locked) =
            row.ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;

        Ok(LoginFailure { attempts, locked })
    }

    async fn clear_login_failures(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET failed_login_attempts = 0, is_locked = FALSE, \
             locked_until = NULL, updated_at = $2 WHERE id = $1",
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to clear login failures", e)
        })?;
        Ok(())
    }

    async fn record_login(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $2, updated_at = $2 WHERE id = $1")
            .bind(user_id)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to record login", e)
            })?;
        Ok(())
    }

    async fn lock(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let result = sqlx::query(
            "UPDATE users SET is_locked = TRUE, locked_until = NULL, updated_at = $2 \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock user", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }

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

    async fn unlock(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET is_locked = FALSE, locked_until = NULL, \
             failed_login_attempts = 0, updated_at = $2 WHERE id = $1",
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to unlock user", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }
        Ok(())
    }

    async fn deactivate(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let result =
            sqlx::query("UPDATE users SET is_active = FALSE, updated_at = $2 WHERE id = $1")
                .bind(user_id)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to deactivate user", e)
                })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }

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

    async fn mark_verified(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET is_verified = TRUE, email_verified_at = $2, updated_at = $2 \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark verified", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }
        Ok(())
    }

    async fn search(
        &self,
        filter: &UserSearchFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<User>> {
        let mut conditions = Vec::new();
        let mut param_idx = 1u32;

        if filter.term.is_some() {
            conditions.push(format!(
                "(email ILIKE ${param_idx} OR first_name ILIKE ${param_idx} \
                 OR last_name ILIKE ${param_idx} \
                 OR first_name || ' ' || last_name ILIKE ${param_idx})"
            ));
            param_idx += 1;
        }
        if filter.role.is_some() {
            conditions.push(format!("role = ${param_idx}"));
            param_idx += 1;
        }
        if filter.is_active.is_some() {
            conditions.push(format!("is_active = ${param_idx}"));
            param_idx += 1;
        }
        if filter.is_verified.is_some() {
            conditions.push(format!("is_verified = ${param_idx}"));
            param_idx += 1;
        }
        if filter.is_locked.is_some() {
            conditions.push(format!("is_locked = ${param_idx}"));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let order_column = match filter.sort_by.unwrap_or(UserSortField::CreatedAt) {
            UserSortField::Email => "email",
            UserSortField::FirstName => "first_name",
            UserSortField::LastName => "last_name",
            UserSortField::Role => "role",
            UserSortField::LastLogin => "last_login_at",
            UserSortField::CreatedAt => "created_at",
        };
        let direction = if filter.sort_desc { "DESC" } else { "ASC" };

        let count_sql = format!("SELECT COUNT(*) FROM users {where_clause}");
        let select_sql = format!(
            "SELECT * FROM users {where_clause} ORDER BY {order_column} {direction} \
             LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        let mut select_query = sqlx::query_as::<_, User>(&select_sql);

        if let Some(ref term) = filter.term {
            let pattern = format!("%{term}%");
            count_query = count_query.bind(pattern.clone());
            select_query = select_query.bind(pattern);
        }
        if let Some(role) = filter.role {
            count_query = count_query.bind(role);
            select_query = select_query.bind(role);
        }
        if let Some(active) = filter.is_active {
            count_query = count_query.bind(active);
            select_query = select_query.bind(active);
        }
        if let Some(verified) = filter.is_verified {
            count_query = count_query.bind(verified);
            select_query = select_query.bind(verified);
        }
        if let Some(locked) = filter.is_locked {
            count_query = count_query.bind(locked);
            select_query = select_query.bind(locked);
        }

        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count users", e))?;

        let users = select_query
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search users", e))?;

        Ok(PageResponse::new(
            users,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn stats(&self, window_start: DateTime<Utc>) -> AppResult<UserStats> {
        let totals: (i64, i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), \
                    COUNT(*) FILTER (WHERE is_active), \
                    COUNT(*) FILTER (WHERE is_verified), \
                    COUNT(*) FILTER (WHERE is_locked) \
             FROM users",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count users", e))?;

        let by_role: Vec<(Role, i64)> =
            sqlx::query_as("SELECT role, COUNT(*) FROM users GROUP BY role")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count users by role", e)
                })?;

        let recent: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE created_at >= $1), \
                    COUNT(*) FILTER (WHERE last_login_at >= $1) \
             FROM users",
        )
        .bind(window_start)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count recent activity", e)
        })?;

        let users_by_role: HashMap<Role, u64> = by_role
            .into_iter()
            .map(|(role, count)| (role, count as u64))
            .collect();

        Ok(UserStats {
            total_users: totals.0 as u64,
            active_users: totals.1 as u64,
            verified_users: totals.2 as u64,
            locked_users: totals.3 as u64,
            users_by_role,
            recent_registrations: recent.0 as u64,
            recent_logins: recent.1 as u64,
        })
    }
}
