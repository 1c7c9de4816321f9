//! Default notification channel.

use async_trait::async_trait;
use tracing::info;

use gatehouse_core::result::AppResult;
use gatehouse_core::traits::Mailer;

/// A `Mailer` that records the link in the log instead of sending email.
///
/// Actual delivery is an external collaborator; deployments plug in their
/// own `Mailer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMailer;

#[async_trait]
impl Mailer for TracingMailer {
    async fn send_password_reset(&self, recipient: &str, token: &str) -> AppResult<()> {
        info!(recipient, token, "Password reset link issued");
        Ok(())
    }

    async fn send_email_verification(&self, recipient: &str, token: &str) -> AppResult<()> {
        info!(recipient, token, "Email verification link issued");
        Ok(())
    }
}
