use async_trait::async_trait;

use super::{generate_message_id, MailError, MailTransport, OutgoingEmail};

/// Console transport for local development.
/// Logs the mail through tracing instead of submitting it.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleTransport;

#[async_trait]
impl MailTransport for ConsoleTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        let message_id = generate_message_id(&email.from);

        tracing::info!(
            message_id = %message_id,
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            body = %email.html,
            "Email sent (console)"
        );

        Ok(message_id)
    }

    async fn verify(&self) -> Result<(), MailError> {
        Ok(())
    }
}
