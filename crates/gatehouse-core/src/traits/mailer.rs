//! Outbound notification channel.

use async_trait::async_trait;

use crate::result::AppResult;

/// Delivery channel for account emails.
///
/// Callers treat delivery as fire-and-forget: a `Mailer` failure is logged
/// by the caller and never fails the surrounding operation.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Deliver a password-reset link carrying the given token.
    async fn send_password_reset(&self, recipient: &str, token: &str) -> AppResult<()>;

    /// Deliver an email-verification link carrying the given token.
    async fn send_email_verification(&self, recipient: &str, token: &str) -> AppResult<()>;
}
