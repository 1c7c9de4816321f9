//! Account lockout state machine.
//!
//! The lock state is derived from the (`is_locked`, `locked_until`) pair on
//! the user row. `is_locked` is the authoritative discriminator: a freshly
//! created user has `locked_until = NULL` too, and must never read as
//! permanently locked.

use chrono::{DateTime, Duration, Utc};

use gatehouse_core::config::auth::AuthConfig;
use gatehouse_core::error::AppError;
use gatehouse_entity::user::User;

/// The lock state of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    /// The account is not locked.
    Unlocked,
    /// The account is locked until the given instant after repeated
    /// failures.
    TemporarilyLocked(DateTime<Utc>),
    /// The account is locked by an administrator until explicitly unlocked.
    PermanentlyLocked,
}

impl AccountState {
    /// Derive the lock state from the user's flags.
    pub fn of(user: &User) -> Self {
        if !user.is_locked {
            return Self::Unlocked;
        }
        match user.locked_until {
            Some(until) => Self::TemporarilyLocked(until),
            None => Self::PermanentlyLocked,
        }
    }
}

/// Lockout threshold and duration, and the authentication gate built on
/// them.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    max_failed_attempts: i32,
    lockout_duration: Duration,
}

impl LockoutPolicy {
    /// Creates a policy from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            max_failed_attempts: config.max_failed_attempts,
            lockout_duration: Duration::minutes(config.lockout_duration_minutes as i64),
        }
    }

    /// The number of consecutive failures that trips a temporary lock.
    pub fn threshold(&self) -> i32 {
        self.max_failed_attempts
    }

    /// The deadline of a temporary lock imposed now.
    pub fn lock_until(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.lockout_duration
    }

    /// Refuses authentication for locked or deactivated accounts.
    ///
    /// A temporary lock whose deadline has passed no longer refuses; the
    /// flags are cleared on the next successful login. The check order
    /// follows the login flow: lock state first, then the active flag.
    pub fn ensure_can_authenticate(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        match AccountState::of(user) {
            AccountState::TemporarilyLocked(until) if now < until => {
                let remaining_minutes = ((until - now).num_seconds() + 59) / 60;
                return Err(AppError::account_locked(format!(
                    "Account is locked. Try again in {remaining_minutes} minutes"
                )));
            }
            AccountState::PermanentlyLocked => {
                return Err(AppError::account_locked(
                    "Account is permanently locked. Contact administrator",
                ));
            }
            _ => {}
        }

        if !user.is_active {
            return Err(AppError::account_inactive());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use gatehouse_core::error::ErrorKind;
    use gatehouse_entity::user::Role;

    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: "unused".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            avatar_url: None,
            role: Role::User,
            is_active: true,
            is_verified: true,
            is_locked: false,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            password_changed_at: now,
            email_verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn policy() -> LockoutPolicy {
        LockoutPolicy::new(&gatehouse_core::config::auth::AuthConfig::default())
    }

    #[test]
    fn test_fresh_user_is_unlocked() {
        // locked_until is NULL on a fresh user; that alone must not read
        // as a permanent lock.
        let user = user();
        assert_eq!(AccountState::of(&user), AccountState::Unlocked);
        assert!(policy().ensure_can_authenticate(&user, Utc::now()).is_ok());
    }

    #[test]
    fn test_temporary_lock_refuses_until_deadline() {
        let now = Utc::now();
        let mut user = user();
        user.is_locked = true;
        user.locked_until = Some(now + Duration::minutes(30));

        let err = policy().ensure_can_authenticate(&user, now).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AccountLocked);
        assert!(err.message.contains("30 minutes"));

        // Past the deadline the gate opens again.
        let later = now + Duration::minutes(31);
        assert!(policy().ensure_can_authenticate(&user, later).is_ok());
    }

    #[test]
    fn test_permanent_lock_never_expires() {
        let now = Utc::now();
        let mut user = user();
        user.is_locked = true;
        user.locked_until = None;

        assert_eq!(AccountState::of(&user), AccountState::PermanentlyLocked);

        let far_future = now + Duration::days(10_000);
        let err = policy()
            .ensure_can_authenticate(&user, far_future)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AccountLocked);
        assert!(err.message.contains("permanently"));
    }

    #[test]
    fn test_inactive_account_is_refused() {
        let mut user = user();
        user.is_active = false;

        let err = policy()
            .ensure_can_authenticate(&user, Utc::now())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AccountInactive);
    }

    #[test]
    fn test_lock_outranks_inactive() {
        // A locked and deactivated account reports the lock, matching the
        // login flow's check order.
        let now = Utc::now();
        let mut user = user();
        user.is_active = false;
        user.is_locked = true;
        user.locked_until = Some(now + Duration::minutes(5));

        let err = policy().ensure_can_authenticate(&user, now).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AccountLocked);
    }
}
