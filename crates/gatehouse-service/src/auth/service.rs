//! Authentication service — login, refresh, logout, password reset, and
//! email verification flows.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use gatehouse_auth::lockout::LockoutPolicy;
use gatehouse_auth::password::{PasswordHasher, PasswordPolicy};
use gatehouse_auth::session::{IssuedTokens, SessionRegistry};
use gatehouse_auth::token::{Claims, TokenDecoder, TokenEncoder, TokenKind, digest};
use gatehouse_core::error::AppError;
use gatehouse_core::traits::{Clock, Mailer};
use gatehouse_core::types::RequestMeta;
use gatehouse_database::stores::{PasswordResetStore, UserStore};
use gatehouse_entity::reset::PasswordResetRequest;
use gatehouse_entity::user::User;

use crate::audit::AuditService;

/// The result of a successful login.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoginOutcome {
    /// Access and refresh tokens for the new session.
    pub tokens: IssuedTokens,
    /// The authenticated user.
    pub user: User,
}

/// Orchestrates the authentication flows over the credential engine, the
/// lockout state machine, the session registry, and the audit trail.
#[derive(Clone)]
pub struct AuthService {
    /// User directory.
    users: Arc<dyn UserStore>,
    /// Password-reset grants.
    resets: Arc<dyn PasswordResetStore>,
    /// Session registry.
    registry: Arc<SessionRegistry>,
    /// Password hashing.
    hasher: Arc<PasswordHasher>,
    /// Password strength policy.
    password_policy: PasswordPolicy,
    /// Lockout threshold and duration.
    lockout: LockoutPolicy,
    /// Token creation for reset and verification grants.
    encoder: Arc<TokenEncoder>,
    /// Token verification.
    decoder: Arc<TokenDecoder>,
    /// Audit trail.
    audit: Arc<AuditService>,
    /// Notification channel.
    mailer: Arc<dyn Mailer>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").finish()
    }
}

impl AuthService {
    /// Creates a new authentication service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserStore>,
        resets: Arc<dyn PasswordResetStore>,
        registry: Arc<SessionRegistry>,
        hasher: Arc<PasswordHasher>,
        password_policy: PasswordPolicy,
        lockout: LockoutPolicy,
        encoder: Arc<TokenEncoder>,
        decoder: Arc<TokenDecoder>,
        audit: Arc<AuditService>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            resets,
            registry,
            hasher,
            password_policy,
            lockout,
            encoder,
            decoder,
            audit,
            mailer,
            clock,
        }
    }

    /// Authenticates a user and opens a session.
    ///
    /// The flow: directory lookup, lockout gate, password verification,
    /// failure bookkeeping, session issue, audit. Credential failures are
    /// indistinguishable between unknown email and wrong password.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
        meta: &RequestMeta,
    ) -> Result<LoginOutcome, AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Err(AppError::invalid_credentials());
        };

        let now = self.clock.now();
        self.lockout.ensure_can_authenticate(&user, now)?;

        if !self.hasher.verify(password, &user.password_hash)? {
            self.handle_failed_login(&user, meta).await?;
            return Err(AppError::invalid_credentials());
        }

        // A successful verification zeroes the counter and clears an
        // expired temporary lock.
        if user.failed_login_attempts > 0 || user.is_locked {
            self.users.clear_login_failures(user.id, now).await?;
        }
        self.users.record_login(user.id, now).await?;

        let user = self
            .users
            .find_by_id(user.id)
            .await?
            .ok_or_else(AppError::invalid_credentials)?;

        let (tokens, session) = self.registry.start_session(&user, remember_me, meta).await?;

        self.audit
            .record(
                Some(user.id),
                "login_successful",
                Some("user"),
                Some(user.id.to_string()),
                None,
                None,
                meta,
            )
            .await?;

        info!(user_id = %user.id, session_id = %session.id, "Login successful");

        Ok(LoginOutcome { tokens, user })
    }

    /// Exchanges a refresh token for a fresh access token.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
        meta: &RequestMeta,
    ) -> Result<String, AppError> {
        let (access_token, session) = self.registry.refresh_access_token(refresh_token).await?;

        self.audit
            .record(
                Some(session.user_id),
                "token_refreshed",
                Some("user"),
                Some(session.user_id.to_string()),
                None,
                None,
                meta,
            )
            .await?;

        Ok(access_token)
    }

    /// Ends one session or all of the user's sessions.
    ///
    /// With `all_devices` set, or when no refresh token is presented, every
    /// session of the user is revoked.
    pub async fn logout(
        &self,
        user: &User,
        refresh_token: Option<&str>,
        all_devices: bool,
        meta: &RequestMeta,
    ) -> Result<(), AppError> {
        let action = if all_devices {
            self.registry.revoke_all(user.id).await?;
            "logout_all_devices"
        } else if let Some(token) = refresh_token {
            self.registry.revoke_by_token(user.id, token).await?;
            "logout"
        } else {
            self.registry.revoke_all(user.id).await?;
            "logout"
        };

        self.audit
            .record(
                Some(user.id),
                action,
                Some("user"),
                Some(user.id.to_string()),
                None,
                None,
                meta,
            )
            .await
    }

    /// Opens a password-reset grant and sends the reset link.
    ///
    /// Always returns success: an unknown or deactivated email produces the
    /// same outcome as a live one, so the endpoint cannot be used to
    /// enumerate accounts. Notification failure is logged and swallowed.
    pub async fn request_password_reset(
        &self,
        email: &str,
        meta: &RequestMeta,
    ) -> Result<(), AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Ok(());
        };
        if !user.is_active {
            return Ok(());
        }

        let now = self.clock.now();
        let token = self.encoder.issue_password_reset(&user.email)?;

        let request = PasswordResetRequest {
            id: Uuid::new_v4(),
            user_id: user.id,
            token_hash: digest(&token),
            is_used: false,
            created_at: now,
            expires_at: now + self.encoder.reset_ttl(),
            used_at: None,
            ip_address: meta.ip_address.clone(),
            user_agent: meta.user_agent.clone(),
        };
        self.resets.create(&request).await?;

        self.audit
            .record(
                Some(user.id),
                "password_reset_requested",
                Some("user"),
                Some(user.id.to_string()),
                None,
                None,
                meta,
            )
            .await?;

        if let Err(e) = self.mailer.send_password_reset(&user.email, &token).await {
            warn!(user_id = %user.id, error = %e, "Password reset delivery failed");
        }

        Ok(())
    }

    /// Redeems a password-reset grant.
    ///
    /// The first successful redemption marks the grant used, replaces the
    /// password, and revokes every session of the user atomically.
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
        meta: &RequestMeta,
    ) -> Result<(), AppError> {
        let claims = self
            .decoder
            .decode(token, TokenKind::PasswordReset)
            .map_err(|_| AppError::invalid_token("Invalid or expired reset token"))?;

        let now = self.clock.now();
        let request = self
            .resets
            .find_by_token_hash(&digest(token))
            .await?
            .filter(|r| r.is_valid(now))
            .ok_or_else(|| AppError::invalid_token("Invalid or expired reset token"))?;

        let user = self
            .users
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        self.password_policy.require(new_password)?;
        let password_hash = self.hasher.hash(new_password)?;

        self.resets
            .consume(request.id, user.id, &password_hash, now)
            .await?;

        self.audit
            .record(
                Some(user.id),
                "password_reset_completed",
                Some("user"),
                Some(user.id.to_string()),
                None,
                None,
                meta,
            )
            .await?;

        info!(user_id = %user.id, "Password reset completed");

        Ok(())
    }

    /// Sends an email-verification link for the user's address.
    pub async fn send_email_verification(
        &self,
        user: &User,
        meta: &RequestMeta,
    ) -> Result<(), AppError> {
        let token = self.encoder.issue_email_verification(&user.email)?;

        self.audit
            .record(
                Some(user.id),
                "email_verification_sent",
                Some("user"),
                Some(user.id.to_string()),
                None,
                None,
                meta,
            )
            .await?;

        if let Err(e) = self
            .mailer
            .send_email_verification(&user.email, &token)
            .await
        {
            warn!(user_id = %user.id, error = %e, "Verification delivery failed");
        }

        Ok(())
    }

    /// Redeems an email-verification grant and marks the address verified.
    pub async fn confirm_email_verification(
        &self,
        token: &str,
        meta: &RequestMeta,
    ) -> Result<User, AppError> {
        let claims = self
            .decoder
            .decode(token, TokenKind::EmailVerification)
            .map_err(|_| AppError::invalid_token("Invalid or expired verification token"))?;

        let user = self
            .users
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let now = self.clock.now();
        self.users.mark_verified(user.id, now).await?;

        self.audit
            .record(
                Some(user.id),
                "email_verified",
                Some("user"),
                Some(user.id.to_string()),
                None,
                Some(json!({ "is_verified": true })),
                meta,
            )
            .await?;

        self.users
            .find_by_id(user.id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Verifies an access token and resolves its user.
    pub async fn verify_access_token(&self, token: &str) -> Result<(Claims, User), AppError> {
        let claims = self.decoder.decode(token, TokenKind::Access)?;

        let user = self
            .users
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or_else(|| AppError::invalid_token("Invalid or expired token"))?;

        if !user.is_active {
            return Err(AppError::account_inactive());
        }

        Ok((claims, user))
    }

    /// Bookkeeping for one failed password verification: increments the
    /// counter, trips the lock at the threshold, and audits both outcomes.
    async fn handle_failed_login(&self, user: &User, meta: &RequestMeta) -> Result<(), AppError> {
        let now = self.clock.now();
        let failure = self
            .users
            .record_login_failure(
                user.id,
                self.lockout.threshold(),
                self.lockout.lock_until(now),
                now,
            )
            .await?;

        if failure.locked {
            warn!(
                user_id = %user.id,
                attempts = failure.attempts,
                "Account locked after repeated failed login attempts"
            );
            self.audit
                .record(
                    Some(user.id),
                    "account_locked_failed_attempts",
                    Some("user"),
                    Some(user.id.to_string()),
                    None,
                    None,
                    meta,
                )
                .await?;
        }

        self.audit
            .record(
                Some(user.id),
                "login_failed",
                Some("user"),
                Some(user.id.to_string()),
                None,
                Some(json!({ "reason": "invalid_password" })),
                meta,
            )
            .await
    }
}
