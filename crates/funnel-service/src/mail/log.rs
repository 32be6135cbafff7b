use async_trait::async_trait;
use tracing::info;

use super::{EmailMessage, MailError, Mailer};

/// Writes emails to the log instead of sending them. Used when no SMTP
/// relay is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "Email not sent (no SMTP configured)"
        );
        Ok(())
    }
}
