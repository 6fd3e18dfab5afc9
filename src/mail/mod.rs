pub mod console;
pub mod monitor;
pub mod smtp;

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::Address;

use crate::config::{Config, MailAdapter};
use crate::error::Result;
use crate::models::RenderedEmail;

pub use console::ConsoleTransport;
pub use monitor::{ProviderHealth, ProviderMonitor, ProviderState, ProviderStatus};
pub use smtp::SmtpTransport;

/// A fully addressed HTML mail, ready for submission.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub from: Mailbox,
    pub to: Address,
    pub subject: String,
    pub html: String,
}

/// Provider acceptance of a message. Acceptance is not final delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: String,
}

/// Submits mail to a provider. Swappable per environment.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Submit one message and return the id it was accepted under.
    async fn send(&self, email: &OutgoingEmail) -> std::result::Result<String, MailError>;

    /// Check that the provider is reachable and accepts our session.
    async fn verify(&self) -> std::result::Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Failed to build message: {0}")]
    Build(String),
    #[error("SMTP error: {0}")]
    Smtp(String),
}

/// Mailer abstraction over the configured transport
#[derive(Clone)]
pub struct Mailer {
    transport: Arc<dyn MailTransport>,
    from: Mailbox,
}

impl Mailer {
    /// Build the mailer selected by `MAIL_ADAPTER`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport: Arc<dyn MailTransport> = match config.mail_adapter {
            MailAdapter::Smtp => Arc::new(SmtpTransport::new(&config.smtp)?),
            MailAdapter::Console => Arc::new(ConsoleTransport),
        };

        Ok(Self::with_transport(transport, config.mail_from.clone()))
    }

    pub fn with_transport(transport: Arc<dyn MailTransport>, from: Mailbox) -> Self {
        Self { transport, from }
    }

    /// Make exactly one submission attempt for a rendered notification.
    pub async fn deliver(&self, to: &Address, email: RenderedEmail) -> Result<DeliveryReceipt> {
        let outgoing = OutgoingEmail {
            from: self.from.clone(),
            to: to.clone(),
            subject: email.subject,
            html: email.body_html,
        };

        let message_id = self.transport.send(&outgoing).await?;

        Ok(DeliveryReceipt { message_id })
    }

    pub async fn verify(&self) -> Result<()> {
        self.transport.verify().await?;
        Ok(())
    }
}

/// `<uuid@domain>` using the sender's domain, like most MTAs do.
pub(crate) fn generate_message_id(from: &Mailbox) -> String {
    format!("<{}@{}>", uuid::Uuid::new_v4(), from.email.domain())
}
