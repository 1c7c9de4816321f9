//! Password strength policy enforcement.

use gatehouse_core::config::auth::AuthConfig;
use gatehouse_core::error::AppError;

/// Characters counted as special by the policy.
const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Penalty applied to the score per violated rule.
const VIOLATION_PENALTY: u8 = 20;

/// The result of evaluating a password against the policy.
///
/// `score` is advisory only; `is_valid` is what registration, password
/// change, and reset paths reject on.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PasswordStrength {
    /// Whether the password satisfies every configured rule.
    pub is_valid: bool,
    /// Human-readable description of each violated rule.
    pub violations: Vec<String>,
    /// Advisory score: 100 minus 20 per violation, floored at 0.
    pub score: u8,
}

/// Validates password strength against configured rules.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    min_length: usize,
    require_uppercase: bool,
    require_lowercase: bool,
    require_digit: bool,
    require_special: bool,
}

impl PasswordPolicy {
    /// Creates a policy from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
            require_uppercase: config.password_require_uppercase,
            require_lowercase: config.password_require_lowercase,
            require_digit: config.password_require_digit,
            require_special: config.password_require_special,
        }
    }

    /// Evaluates a password against every configured rule.
    pub fn evaluate(&self, password: &str) -> PasswordStrength {
        let mut violations = Vec::new();

        if password.chars().count() < self.min_length {
            violations.push(format!(
                "Password must be at least {} characters long",
                self.min_length
            ));
        }

        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            violations.push("Password must contain at least one uppercase letter".to_string());
        }

        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            violations.push("Password must contain at least one lowercase letter".to_string());
        }

        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            violations.push("Password must contain at least one digit".to_string());
        }

        if self.require_special && !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
            violations.push("Password must contain at least one special character".to_string());
        }

        let penalty = (violations.len() as u8).saturating_mul(VIOLATION_PENALTY);
        PasswordStrength {
            is_valid: violations.is_empty(),
            score: 100u8.saturating_sub(penalty),
            violations,
        }
    }

    /// Rejects a password that fails the policy, listing every violated
    /// rule in the error.
    pub fn require(&self, password: &str) -> Result<(), AppError> {
        let strength = self.evaluate(password);
        if strength.is_valid {
            Ok(())
        } else {
            Err(AppError::weak_password(format!(
                "Password validation failed: {}",
                strength.violations.join(", ")
            )))
        }
    }

    /// Rejects a new password identical to the current one.
    pub fn require_different(&self, current: &str, new: &str) -> Result<(), AppError> {
        if current == new {
            return Err(AppError::weak_password(
                "New password must be different from the current password",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PasswordPolicy {
        PasswordPolicy::new(&AuthConfig::default())
    }

    #[test]
    fn test_valid_password() {
        let strength = policy().evaluate("Str0ng!Pw");
        assert!(strength.is_valid);
        assert!(strength.violations.is_empty());
        assert_eq!(strength.score, 100);
    }

    #[test]
    fn test_each_violation_costs_twenty() {
        // Too short, no uppercase, no digit, no special: four violations.
        let strength = policy().evaluate("abc");
        assert!(!strength.is_valid);
        assert_eq!(strength.violations.len(), 4);
        assert_eq!(strength.score, 20);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let strength = policy().evaluate("");
        assert!(!strength.is_valid);
        assert_eq!(strength.violations.len(), 5);
        assert_eq!(strength.score, 0);
    }

    #[test]
    fn test_missing_special_char() {
        let strength = policy().evaluate("Passw0rdd");
        assert!(!strength.is_valid);
        assert_eq!(strength.violations.len(), 1);
        assert_eq!(strength.score, 80);
        assert!(strength.violations[0].contains("special"));
    }

    #[test]
    fn test_require_rejects_with_all_violations() {
        let err = policy().require("short").unwrap_err();
        assert_eq!(err.kind, gatehouse_core::error::ErrorKind::WeakPassword);
        assert!(err.message.contains("8 characters"));
        assert!(err.message.contains("digit"));
    }

    #[test]
    fn test_require_different() {
        assert!(policy().require_different("Old!Pw123", "New!Pw123").is_ok());
        assert!(policy().require_different("Same!Pw1", "Same!Pw1").is_err());
    }
}
