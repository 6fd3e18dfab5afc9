use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::{self, authentication::Credentials};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use super::{generate_message_id, MailError, MailTransport, OutgoingEmail};
use crate::config::{SmtpSettings, SmtpTls};

/// SMTP submission through lettre's pooled async transport
pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let invalid_relay = |e: smtp::Error| {
            MailError::Config(format!("Invalid SMTP relay {}: {}", settings.host, e))
        };

        let builder = match settings.tls {
            SmtpTls::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                    .map_err(invalid_relay)?
            }
            SmtpTls::Implicit => {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host).map_err(invalid_relay)?
            }
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host),
        };

        let mut builder = builder
            .port(settings.port)
            .timeout(Some(settings.timeout));

        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        tracing::info!(
            host = %settings.host,
            port = settings.port,
            tls = ?settings.tls,
            "SMTP transport configured"
        );

        Ok(Self {
            inner: builder.build(),
        })
    }
}

fn build_message(email: &OutgoingEmail, message_id: &str) -> Result<Message, MailError> {
    Message::builder()
        .message_id(Some(message_id.to_string()))
        .from(email.from.clone())
        .to(Mailbox::new(None, email.to.clone()))
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_HTML)
        .body(email.html.clone())
        .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        let message_id = generate_message_id(&email.from);
        let message = build_message(email, &message_id)?;

        let response = self
            .inner
            .send(message)
            .await
            .map_err(|e| MailError::Smtp(e.to_string()))?;

        tracing::debug!(
            code = %response.code(),
            response = %response.message().collect::<Vec<_>>().join(" "),
            "SMTP server accepted message"
        );

        Ok(message_id)
    }

    async fn verify(&self) -> Result<(), MailError> {
        match self.inner.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(MailError::Smtp(
                "server did not answer the connection test".to_string(),
            )),
            Err(e) => Err(MailError::Smtp(e.to_string())),
        }
    }
}
